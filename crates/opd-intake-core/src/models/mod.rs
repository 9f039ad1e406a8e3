//! Domain models for clinic intake.

mod choices;
mod visit;

pub use choices::*;
pub use visit::*;
