//! OPD Intake Core Library
//!
//! Offline visit intake for a small clinic.
//!
//! # Architecture
//!
//! ```text
//! Intake form (raw text)
//!         │
//!     Validation ──── first failing field reported, nothing written
//!         │
//!  ┌──────▼──────────────────────────────┐
//!  │  DB transaction: INSERT visit row    │
//!  │  Monthly workbook: append row        │
//!  │  COMMIT only if the workbook saved   │
//!  └──────┬──────────────────────────────┘
//!         │
//!   Report on request ──► <reports>/<YYYY_MM>/<name>_<date>_<opd>.pdf
//! ```
//!
//! # Modules
//!
//! - [`models`]: Visit record and fixed-choice fields
//! - [`validation`]: Intake form and field rules
//! - [`db`]: SQLite visit table
//! - [`export`]: Monthly workbooks and printable reports
//! - [`config`]: TOML configuration and default folders
//! - [`service`]: The save/report pipeline

pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use config::ClinicConfig;
pub use db::Database;
pub use export::{Letterhead, ReportWriter, WorkbookStore};
pub use models::{FeeType, Gender, VisitRecord};
pub use service::Clinic;
pub use validation::{ValidationError, VisitForm};

use thiserror::Error;

/// Any failure surfaced to the person at the front desk.
#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("{0}")]
    Validation(#[from] validation::ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error(transparent)]
    Export(#[from] export::ExportError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(
        "The visit was added to {} but could not be saved to the database ({source}). Run `rebuild-workbooks` to bring the workbook back in line.",
        workbook.display()
    )]
    CommitAfterWorkbook {
        workbook: std::path::PathBuf,
        source: db::DbError,
    },

    #[error("No visit with id {0}")]
    NotFound(i64),
}
