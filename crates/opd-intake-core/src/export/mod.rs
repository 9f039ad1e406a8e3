//! Workbook and report output for saved visits.

mod naming;
mod report;
mod workbook;

pub use naming::*;
pub use report::*;
pub use workbook::*;

use std::path::PathBuf;
use thiserror::Error;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} is open in another program. Close it and try again.", .0.display())]
    WorkbookLocked(PathBuf),

    #[error("Workbook write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook read error in {}: {reason}", path.display())]
    WorkbookRead { path: PathBuf, reason: String },

    #[error(
        "Sheet '{sheet}' in {} does not start with the visit header row; it was left unchanged.",
        path.display()
    )]
    UnrecognizedHeader { path: PathBuf, sheet: String },

    #[error("PDF error: {0}")]
    Pdf(String),
}

pub type ExportResult<T> = Result<T, ExportError>;
