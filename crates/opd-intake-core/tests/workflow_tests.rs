//! End-to-end save and export tests.

use std::fs;
use std::path::Path;

use opd_intake_core::export::{read_rows, report_fields, CellValue, Letterhead};
use opd_intake_core::{Clinic, ClinicError, Database, ReportWriter, VisitForm, WorkbookStore};

fn form(date: &str, opd_no: &str, name: &str) -> VisitForm {
    VisitForm {
        date: date.to_string(),
        opd_no: opd_no.to_string(),
        name: name.to_string(),
        guardian_name: "Richard Roe".to_string(),
        age_years: "34".to_string(),
        age_months: String::new(),
        gender: "Male".to_string(),
        cnic: "12345-1234567-1".to_string(),
        address: "123 Demo Street\nSpringfield".to_string(),
        temperature: "98.6".to_string(),
        blood_pressure: "120/80".to_string(),
        weight: "72.5".to_string(),
        diabetic: "110".to_string(),
        fee: "Normal".to_string(),
    }
}

fn open_clinic(base: &Path) -> Clinic {
    let db = Database::open(base.join("db").join("clinic.db")).unwrap();
    Clinic::with_parts(
        db,
        WorkbookStore::new(base.join("data")),
        ReportWriter::new(base.join("reports"), Letterhead::default()),
    )
}

#[test]
fn test_save_and_export_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let mut clinic = open_clinic(dir.path());

    let record = clinic.submit(&form("25/10/2025", "OPD-001", "John Doe")).unwrap();
    assert!(record.id.is_some());
    assert_eq!(clinic.visit_count().unwrap(), 1);

    // Database row
    let stored = clinic.visit(record.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored, record);

    // Workbook row
    let workbook = clinic.workbook_path(record.date);
    assert!(workbook.ends_with("ClinicData_October2025.xlsx"));
    let rows = read_rows(&workbook).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row[0], CellValue::Text("OPD-001".into()));
    assert_eq!(row[1], CellValue::Text("25/10/2025".into()));
    assert_eq!(row[2], CellValue::Text("John Doe".into()));
    assert_eq!(row[3], CellValue::Text("Richard Roe".into()));
    assert_eq!(row[4], CellValue::Number(34.0));
    assert_eq!(row[7], CellValue::Text("12345-1234567-1".into()));
    assert_eq!(row[8], CellValue::Text("123 Demo Street, Springfield".into()));
    assert_eq!(row[9], CellValue::Number(98.6));
    assert_eq!(row[10], CellValue::Text("120/80".into()));
    assert_eq!(row[11], CellValue::Number(72.5));
    assert_eq!(row[12], CellValue::Number(110.0));
    assert_eq!(row[13], CellValue::Text("Normal - Rs. 100".into()));

    // Report only on request
    assert!(!dir.path().join("reports").exists());
    let report = clinic.generate_report(&stored).unwrap();
    assert!(report.exists());
    assert!(report.starts_with(dir.path().join("reports").join("2025_10")));

    let fields = report_fields(&stored);
    let value = |label: &str| fields.iter().find(|f| f.label == label).unwrap().value.clone();
    assert_eq!(value("OPD No"), "OPD-001");
    assert_eq!(value("Patient Name"), "John Doe");
    assert_eq!(value("Address"), "123 Demo Street, Springfield");
}

#[test]
fn test_invalid_form_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut clinic = open_clinic(dir.path());

    let blanks: [fn(&mut VisitForm); 6] = [
        |f| f.opd_no.clear(),
        |f| f.name.clear(),
        |f| f.guardian_name.clear(),
        |f| f.address.clear(),
        |f| f.age_years.clear(),
        |f| f.blood_pressure = "high".into(),
    ];

    for blank in blanks {
        let mut f = form("25/10/2025", "OPD-001", "John Doe");
        blank(&mut f);
        let err = clinic.submit(&f).unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    assert_eq!(clinic.visit_count().unwrap(), 0);
    assert!(clinic.workbooks().list_workbooks().unwrap().is_empty());
}

#[test]
fn test_months_are_kept_apart() {
    let dir = tempfile::tempdir().unwrap();
    let mut clinic = open_clinic(dir.path());

    let october = clinic.submit(&form("31/10/2025", "1", "Oct Patient")).unwrap();
    let november = clinic.submit(&form("01/11/2025", "2", "Nov Patient")).unwrap();
    let november_2 = clinic.submit(&form("15/11/2025", "3", "Nov Patient 2")).unwrap();

    let oct_book = clinic.workbook_path(october.date);
    let nov_book = clinic.workbook_path(november.date);
    assert_ne!(oct_book, nov_book);
    assert_eq!(read_rows(&oct_book).unwrap().len(), 1);
    assert_eq!(read_rows(&nov_book).unwrap().len(), 2);

    let oct_report = clinic.generate_report(&october).unwrap();
    let nov_report = clinic.generate_report(&november_2).unwrap();
    assert_ne!(oct_report.parent(), nov_report.parent());
    assert!(oct_report.parent().unwrap().ends_with("2025_10"));
    assert!(nov_report.parent().unwrap().ends_with("2025_11"));

    assert_eq!(clinic.visits_in_month(2025, 11).unwrap().len(), 2);
    assert_eq!(clinic.visits_in_month(2025, 10).unwrap().len(), 1);
}

#[test]
fn test_rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut clinic = open_clinic(dir.path());
        clinic.submit(&form("01/10/2025", "1", "First")).unwrap();
        clinic.submit(&form("02/10/2025", "2", "Second")).unwrap();
    }

    let clinic = open_clinic(dir.path());
    let names: Vec<String> = clinic.visits().unwrap().into_iter().map(|v| v.name).collect();
    assert_eq!(names, vec!["Second", "First"]);
}

#[test]
fn test_failed_workbook_write_leaves_no_row() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("data");
    // A file where the data folder should be makes every workbook write fail
    fs::write(&blocked, "not a folder").unwrap();

    let db = Database::open(dir.path().join("clinic.db")).unwrap();
    let mut clinic = Clinic::with_parts(
        db,
        WorkbookStore::new(&blocked),
        ReportWriter::new(dir.path().join("reports"), Letterhead::default()),
    );

    let err = clinic.submit(&form("25/10/2025", "OPD-001", "John Doe")).unwrap_err();
    assert!(matches!(err, ClinicError::Export(_)));
    assert_eq!(clinic.visit_count().unwrap(), 0);
}

#[test]
fn test_report_for_unknown_id() {
    let dir = tempfile::tempdir().unwrap();
    let clinic = open_clinic(dir.path());
    assert!(matches!(
        clinic.generate_report_for(99),
        Err(ClinicError::NotFound(99))
    ));
}

#[test]
fn test_rebuild_workbooks_from_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut clinic = open_clinic(dir.path());
    let saved = clinic.submit(&form("05/10/2025", "1", "Kept")).unwrap();

    // Workbook lost or hand-edited: rebuild restores it from the database
    let path = clinic.workbook_path(saved.date);
    fs::remove_file(&path).unwrap();

    let summary = clinic.rebuild_workbooks().unwrap();
    assert_eq!(summary.records, 1);
    assert!(summary.backup_dir.is_none());
    assert_eq!(summary.written, vec![path.clone()]);
    assert_eq!(read_rows(&path).unwrap()[0][2], CellValue::Text("Kept".into()));
}

#[test]
fn test_unrecognized_workbook_blocks_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut clinic = open_clinic(dir.path());

    // Someone reused this month's file for something else
    let path = clinic.workbook_path(chrono::NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut workbook = rust_xlsxwriter::Workbook::new();
    workbook.add_worksheet().write_string(0, 0, "Budget").unwrap();
    workbook.save(&path).unwrap();

    let err = clinic.submit(&form("25/10/2025", "OPD-001", "John Doe")).unwrap_err();
    assert!(matches!(
        err,
        ClinicError::Export(opd_intake_core::export::ExportError::UnrecognizedHeader { .. })
    ));
    assert_eq!(clinic.visit_count().unwrap(), 0);
}
