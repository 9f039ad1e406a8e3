//! Intake form validation.
//!
//! The form is held as raw text exactly as typed. [`VisitForm::validate`]
//! checks every field in form order and either produces a [`VisitRecord`]
//! ready to persist or reports the first problem found. Nothing is written
//! anywhere until validation has passed.
//!
//! [`VisitRecord`]: crate::models::VisitRecord

mod form;
mod rules;

pub use form::*;
pub use rules::*;
