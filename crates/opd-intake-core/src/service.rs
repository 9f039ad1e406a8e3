//! Save and report pipeline tying the database to the monthly outputs.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::ClinicConfig;
use crate::db::{insert_visit_on, Database, DbError};
use crate::export::{RebuildSummary, ReportWriter, WorkbookStore};
use crate::models::VisitRecord;
use crate::validation::VisitForm;
use crate::ClinicError;

/// One clinic's visit database together with its workbooks and reports.
pub struct Clinic {
    db: Database,
    workbooks: WorkbookStore,
    reports: ReportWriter,
}

impl Clinic {
    /// Open the configured database and output folders.
    pub fn open(config: &ClinicConfig) -> Result<Self, ClinicError> {
        let db = Database::open(config.storage.database_path())?;
        Ok(Self::with_parts(
            db,
            WorkbookStore::new(config.storage.data_dir()),
            ReportWriter::new(config.storage.reports_dir(), config.clinic.clone()),
        ))
    }

    pub fn with_parts(db: Database, workbooks: WorkbookStore, reports: ReportWriter) -> Self {
        Self {
            db,
            workbooks,
            reports,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn workbooks(&self) -> &WorkbookStore {
        &self.workbooks
    }

    pub fn reports(&self) -> &ReportWriter {
        &self.reports
    }

    /// Validate and save a form.
    ///
    /// The database row and the workbook row are written together: the row is
    /// inserted inside a transaction that is committed only after the
    /// workbook has been saved. Validation failures write nothing.
    pub fn submit(&mut self, form: &VisitForm) -> Result<VisitRecord, ClinicError> {
        let mut record = form.validate()?;

        let tx = self.db.transaction()?;
        let id = insert_visit_on(&tx, &record)?;
        record.id = Some(id);

        let workbook = match self.workbooks.append(&record) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(error = %e, opd_no = %record.opd_no, "workbook update failed, visit not saved");
                return Err(e.into());
            }
        };
        commit_after_workbook(tx.commit(), &workbook)?;

        tracing::info!(
            id,
            opd_no = %record.opd_no,
            date = %record.date,
            workbook = %workbook.display(),
            "saved visit"
        );
        Ok(record)
    }

    /// Write the printable report for a saved visit.
    pub fn generate_report(&self, record: &VisitRecord) -> Result<PathBuf, ClinicError> {
        tracing::debug!(id = ?record.id, "generating report");
        Ok(self.reports.generate(record)?)
    }

    /// Write the report for the visit with row id `id`.
    pub fn generate_report_for(&self, id: i64) -> Result<PathBuf, ClinicError> {
        let record = self.visit(id)?.ok_or(ClinicError::NotFound(id))?;
        self.generate_report(&record)
    }

    pub fn visit(&self, id: i64) -> Result<Option<VisitRecord>, ClinicError> {
        Ok(self.db.get_visit(id)?)
    }

    /// All visits, most recent first.
    pub fn visits(&self) -> Result<Vec<VisitRecord>, ClinicError> {
        Ok(self.db.list_visits()?)
    }

    pub fn visits_in_month(&self, year: i32, month: u32) -> Result<Vec<VisitRecord>, ClinicError> {
        Ok(self.db.list_visits_in_month(year, month)?)
    }

    pub fn visit_count(&self) -> Result<usize, ClinicError> {
        Ok(self.db.count_visits()?)
    }

    /// Monthly workbook holding visits dated in the month of `date`.
    pub fn workbook_path(&self, date: NaiveDate) -> PathBuf {
        self.workbooks.workbook_path(date)
    }

    /// Regenerate every monthly workbook from the database.
    pub fn rebuild_workbooks(&self) -> Result<RebuildSummary, ClinicError> {
        let records = self.db.list_visits()?;
        let summary = self.workbooks.rebuild(&records)?;
        tracing::info!(
            records = summary.records,
            workbooks = summary.written.len(),
            "rebuilt monthly workbooks"
        );
        Ok(summary)
    }
}

/// The workbook row is already on disk when the commit runs, so a failed
/// commit leaves the workbook one row ahead of the database.
fn commit_after_workbook(result: rusqlite::Result<()>, workbook: &Path) -> Result<(), ClinicError> {
    result.map_err(|e| {
        tracing::error!(
            error = %e,
            workbook = %workbook.display(),
            "database commit failed after the workbook row was written; run rebuild-workbooks"
        );
        ClinicError::CommitAfterWorkbook {
            workbook: workbook.to_path_buf(),
            source: DbError::from(e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_failure_names_the_workbook() {
        let workbook = Path::new("data").join("ClinicData_October2025.xlsx");
        let err = commit_after_workbook(Err(rusqlite::Error::InvalidQuery), &workbook).unwrap_err();

        assert!(matches!(&err, ClinicError::CommitAfterWorkbook { workbook: w, .. } if *w == workbook));
        let message = err.to_string();
        assert!(message.contains("ClinicData_October2025.xlsx"));
        assert!(message.contains("rebuild-workbooks"));

        assert!(commit_after_workbook(Ok(()), &workbook).is_ok());
    }
}
