//! # opd-intake-cli: Front-Desk Command Line
//!
//! Terminal front end for the clinic intake library. Argument parsing and
//! terminal I/O live here; saving, exporting and reporting are delegated to
//! `opd_intake_core`.
//!
//! ## Subcommands
//!
//! - `new` / `add`: Enter a visit interactively or from flags
//! - `list` / `report`: Browse saved visits and print their reports
//! - `workbook` / `rebuild-workbooks`: Monthly workbook lookup and repair
//! - `paths`: Show where data is kept

pub mod entry;
pub mod files;
pub mod open;
pub mod prompt;
pub mod records;
