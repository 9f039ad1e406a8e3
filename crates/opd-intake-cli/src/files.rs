//! # File Location Subcommands
//!
//! Where the database, monthly workbooks and reports live, and rebuilding
//! the workbooks from the database.

use std::io::Write;
use std::path::Path;

use clap::Args;
use opd_intake_core::config::ClinicConfig;
use opd_intake_core::Clinic;

use crate::open::open_path;
use crate::records::{parse_month, Month};

/// Arguments for the workbook subcommand.
#[derive(Args, Debug, Default)]
pub struct WorkbookArgs {
    /// Month to look up (YYYY-MM). Defaults to the current month.
    #[arg(long, value_parser = parse_month)]
    pub month: Option<Month>,

    /// Open the workbook in the default spreadsheet program.
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the paths subcommand.
#[derive(Args, Debug, Default)]
pub struct PathsArgs {
    /// Open the data folder.
    #[arg(long)]
    pub open: bool,
}

pub fn run_workbook(
    clinic: &Clinic,
    args: &WorkbookArgs,
    this_month: Month,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let month = args.month.unwrap_or(this_month);
    let first_day = month
        .first_day()
        .ok_or_else(|| anyhow::anyhow!("invalid month {}-{:02}", month.year, month.month))?;
    let path = clinic.workbook_path(first_day);

    if !path.exists() {
        writeln!(
            out,
            "No workbook for {} yet. It will be created at {} when a visit is saved.",
            first_day.format("%B %Y"),
            path.display()
        )?;
        return Ok(());
    }

    writeln!(out, "{}", path.display())?;
    if args.open {
        open_path(&path)?;
    }
    Ok(())
}

pub fn run_rebuild(clinic: &Clinic, out: &mut impl Write) -> anyhow::Result<()> {
    let summary = clinic.rebuild_workbooks()?;
    if let Some(backup) = &summary.backup_dir {
        writeln!(
            out,
            "Backed up {} workbook(s) to {}",
            summary.backed_up.len(),
            backup.display()
        )?;
    }
    for path in &summary.written {
        writeln!(out, "Wrote {}", path.display())?;
    }
    writeln!(
        out,
        "Rebuilt {} workbook(s) from {} visit(s)",
        summary.written.len(),
        summary.records
    )?;
    Ok(())
}

pub fn run_paths(
    config: &ClinicConfig,
    config_path: Option<&Path>,
    args: &PathsArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let storage = &config.storage;
    let config_line = config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());

    writeln!(out, "Config:    {config_line}")?;
    writeln!(out, "Database:  {}", storage.database_path().display())?;
    writeln!(out, "Workbooks: {}", storage.data_dir().display())?;
    writeln!(out, "Reports:   {}", storage.reports_dir().display())?;

    if args.open {
        let data_dir = storage.data_dir();
        std::fs::create_dir_all(&data_dir)?;
        open_path(&data_dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use opd_intake_core::config::StorageConfig;
    use opd_intake_core::export::Letterhead;
    use opd_intake_core::{Database, ReportWriter, VisitForm, WorkbookStore};

    fn clinic(base: &Path) -> Clinic {
        Clinic::with_parts(
            Database::open_in_memory().unwrap(),
            WorkbookStore::new(base.join("data")),
            ReportWriter::new(base.join("reports"), Letterhead::default()),
        )
    }

    fn october() -> Month {
        Month {
            year: 2025,
            month: 10,
        }
    }

    #[test]
    fn test_workbook_not_created_yet() {
        let dir = tempfile::tempdir().unwrap();
        let clinic = clinic(dir.path());

        let mut out = Vec::new();
        run_workbook(&clinic, &WorkbookArgs::default(), october(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("No workbook for October 2025 yet."));
        assert!(text.contains("ClinicData_October2025.xlsx"));
    }

    #[test]
    fn test_workbook_and_rebuild_after_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut clinic = clinic(dir.path());
        let form = VisitForm {
            opd_no: "1".into(),
            name: "Asma".into(),
            guardian_name: "Tariq".into(),
            age_years: "28".into(),
            address: "Bazaar".into(),
            ..VisitForm::new(chrono::NaiveDate::from_ymd_opt(2025, 10, 3).unwrap())
        };
        clinic.submit(&form).unwrap();

        let mut out = Vec::new();
        run_workbook(&clinic, &WorkbookArgs::default(), october(), &mut out).unwrap();
        let expected = dir.path().join("data").join("ClinicData_October2025.xlsx");
        assert_eq!(String::from_utf8(out).unwrap().trim(), expected.display().to_string());

        let mut out = Vec::new();
        run_rebuild(&clinic, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Backed up 1 workbook(s)"));
        assert!(text.ends_with("Rebuilt 1 workbook(s) from 1 visit(s)\n"));
    }

    #[test]
    fn test_paths_listing() {
        let config = ClinicConfig {
            storage: StorageConfig {
                database_path: Some(PathBuf::from("/srv/opd/clinic.db")),
                data_dir: Some(PathBuf::from("/srv/opd/data")),
                reports_dir: None,
            },
            ..Default::default()
        };

        let mut out = Vec::new();
        run_paths(&config, None, &PathsArgs::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Config:    (defaults)"));
        assert!(text.contains("Database:  /srv/opd/clinic.db"));
        assert!(text.contains(&format!(
            "Reports:   {}",
            PathBuf::from("/srv/opd/data").join("Reports").display()
        )));
    }
}
