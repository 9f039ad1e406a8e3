//! Monthly spreadsheet workbooks.
//!
//! Every saved visit is mirrored as one row in the workbook for its calendar
//! month. Appending reads the whole workbook back, adds the new rows under
//! the last used row of the first sheet and rewrites the file. Every sheet is
//! carried over with its text, numbers, booleans, dates and formulas. Cell
//! styling other than date formats and the bold header is not carried over.
//!
//! New values are placed by header name, so workbooks whose columns were
//! reordered or that predate a column keep their layout; missing columns are
//! added at the right.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError as ReadError};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use super::naming::{workbook_file_name, workbook_sheet_name, WORKBOOK_PREFIX};
use super::{ExportError, ExportResult};
use crate::models::VisitRecord;

/// Header row of every monthly workbook.
pub const WORKBOOK_HEADERS: [&str; 14] = [
    "OPD No",
    "Visit Date",
    "Patient Name",
    "Father/Husband Name",
    "Age",
    "Age (Months)",
    "Gender",
    "CNIC",
    "Address",
    "Temperature (°F)",
    "Blood Pressure",
    "Weight (kg)",
    "Diabetic (mg/dl)",
    "Fees Type",
];

/// Columns an existing first row must carry to be taken as the visit header.
const IDENTITY_HEADERS: [&str; 3] = ["OPD No", "Visit Date", "Patient Name"];

const MAX_COLUMN_WIDTH: usize = 40;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel date serial number
    DateTime(f64),
    /// Formula text; the cached result is recalculated by the spreadsheet program
    Formula(String),
    Empty,
}

impl CellValue {
    fn display_len(&self) -> usize {
        match self {
            CellValue::Text(s) | CellValue::Formula(s) => s.chars().count(),
            CellValue::Number(n) => n.to_string().len(),
            CellValue::Bool(true) => 4,
            CellValue::Bool(false) => 5,
            CellValue::DateTime(_) => 10,
            CellValue::Empty => 0,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

fn optional_number(value: Option<f64>) -> CellValue {
    value.map(CellValue::Number).unwrap_or(CellValue::Empty)
}

/// Workbook row for a visit, in [`WORKBOOK_HEADERS`] order.
pub fn visit_row(record: &VisitRecord) -> Vec<CellValue> {
    vec![
        CellValue::Text(record.opd_no.clone()),
        CellValue::Text(record.display_date()),
        CellValue::Text(record.name.clone()),
        CellValue::Text(record.guardian_name.clone()),
        CellValue::Number(f64::from(record.age_years)),
        optional_number(record.age_months.map(f64::from)),
        CellValue::Text(record.gender.as_str().to_string()),
        CellValue::Text(record.cnic.clone().unwrap_or_default()),
        CellValue::Text(record.single_line_address()),
        CellValue::Number(record.temperature_f),
        CellValue::Text(record.blood_pressure.clone()),
        optional_number(record.weight_kg),
        optional_number(record.diabetic_mg_dl),
        CellValue::Text(record.fee.label()),
    ]
}

/// One worksheet, cells at their position in the sheet (row 0 is the first row).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Empty)
    }

    fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if self.rows.len() <= row {
            self.rows.resize(row + 1, Vec::new());
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    }

    fn is_blank(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(|c| *c == CellValue::Empty))
    }

    fn header_position(&self, name: &str) -> Option<usize> {
        self.rows.first()?.iter().position(|cell| {
            cell.as_text()
                .is_some_and(|text| text.trim().eq_ignore_ascii_case(name))
        })
    }

    /// Column of each [`WORKBOOK_HEADERS`] entry, adding missing ones to the
    /// header row.
    fn visit_columns(&mut self, path: &Path) -> ExportResult<Vec<usize>> {
        if self.is_blank() {
            self.rows = vec![WORKBOOK_HEADERS
                .iter()
                .map(|h| CellValue::Text(h.to_string()))
                .collect()];
            return Ok((0..WORKBOOK_HEADERS.len()).collect());
        }

        if IDENTITY_HEADERS
            .iter()
            .any(|name| self.header_position(name).is_none())
        {
            return Err(ExportError::UnrecognizedHeader {
                path: path.to_path_buf(),
                sheet: self.name.clone(),
            });
        }

        let mut next = self.rows[0].len();
        let mut columns = Vec::with_capacity(WORKBOOK_HEADERS.len());
        for name in WORKBOOK_HEADERS {
            let col = match self.header_position(name) {
                Some(col) => col,
                None => {
                    tracing::info!(path = %path.display(), column = name, "adding missing workbook column");
                    let col = next;
                    self.set(0, col, CellValue::Text(name.to_string()));
                    next += 1;
                    col
                }
            };
            columns.push(col);
        }
        Ok(columns)
    }
}

/// Outcome of regenerating every workbook from the database.
#[derive(Debug, Clone, Default)]
pub struct RebuildSummary {
    /// Folder holding copies of the workbooks that were replaced
    pub backup_dir: Option<PathBuf>,
    pub backed_up: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
    pub records: usize,
}

/// Monthly workbooks kept in one data folder.
#[derive(Debug, Clone)]
pub struct WorkbookStore {
    data_dir: PathBuf,
}

impl WorkbookStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Workbook that holds visits for the month of `date`.
    pub fn workbook_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir.join(workbook_file_name(date))
    }

    /// Append one visit to its month's workbook, creating the workbook if needed.
    pub fn append(&self, record: &VisitRecord) -> ExportResult<PathBuf> {
        let path = self.workbook_path(record.date);
        self.append_rows(&path, record.date, vec![visit_row(record)])?;
        Ok(path)
    }

    /// Append visits grouped by month. Each affected workbook is saved once.
    pub fn append_all(&self, records: &[VisitRecord]) -> ExportResult<Vec<PathBuf>> {
        let mut grouped: BTreeMap<PathBuf, (NaiveDate, Vec<Vec<CellValue>>)> = BTreeMap::new();
        for record in records {
            grouped
                .entry(self.workbook_path(record.date))
                .or_insert_with(|| (record.date, Vec::new()))
                .1
                .push(visit_row(record));
        }

        let mut written = Vec::with_capacity(grouped.len());
        for (path, (month, rows)) in grouped {
            self.append_rows(&path, month, rows)?;
            written.push(path);
        }
        Ok(written)
    }

    fn append_rows(
        &self,
        path: &Path,
        month: NaiveDate,
        new_rows: Vec<Vec<CellValue>>,
    ) -> ExportResult<()> {
        fs::create_dir_all(&self.data_dir)?;
        ensure_writable(path)?;

        let mut sheets = if path.exists() {
            read_sheets(path)?
        } else {
            Vec::new()
        };
        if sheets.is_empty() {
            sheets.push(Sheet::new(workbook_sheet_name(month)));
        }

        let visits = &mut sheets[0];
        let columns = visits.visit_columns(path)?;
        let added = new_rows.len();
        for row in new_rows {
            let row_idx = visits.rows.len();
            visits.rows.push(Vec::new());
            for (cell, &col) in row.into_iter().zip(&columns) {
                if cell != CellValue::Empty {
                    visits.set(row_idx, col, cell);
                }
            }
        }
        let total = visits.rows.len() - 1;

        write_workbook(path, &sheets)?;
        tracing::info!(path = %path.display(), added, total, "updated monthly workbook");
        Ok(())
    }

    /// Monthly workbooks currently in the data folder, sorted by file name.
    pub fn list_workbooks(&self) -> ExportResult<Vec<PathBuf>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{WORKBOOK_PREFIX}_");
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            let is_workbook = path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".xlsx"));
            if is_workbook {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Replace every monthly workbook with one regenerated from `records`.
    ///
    /// Existing workbooks are copied into a `backup_<timestamp>` folder first
    /// and only then removed.
    pub fn rebuild(&self, records: &[VisitRecord]) -> ExportResult<RebuildSummary> {
        let existing = self.list_workbooks()?;
        for path in &existing {
            ensure_writable(path)?;
        }

        let mut summary = RebuildSummary {
            records: records.len(),
            ..Default::default()
        };

        if !existing.is_empty() {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let backup_dir = self.data_dir.join(format!("backup_{stamp}"));
            fs::create_dir_all(&backup_dir)?;
            for path in &existing {
                if let Some(name) = path.file_name() {
                    let target = backup_dir.join(name);
                    fs::copy(path, &target)?;
                    summary.backed_up.push(target);
                }
            }
            for path in &existing {
                fs::remove_file(path)?;
            }
            tracing::info!(backup = %backup_dir.display(), count = existing.len(), "backed up workbooks");
            summary.backup_dir = Some(backup_dir);
        }

        let mut ordered = records.to_vec();
        ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        summary.written = self.append_all(&ordered)?;
        Ok(summary)
    }
}

/// Every sheet of a workbook, in workbook order.
pub fn read_sheets(path: &Path) -> ExportResult<Vec<Sheet>> {
    let read_error = |e: ReadError| ExportError::WorkbookRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(&read_error)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let values = workbook.worksheet_range(&name).map_err(&read_error)?;
        let formulas = workbook.worksheet_formula(&name).map_err(&read_error)?;

        let mut sheet = Sheet::new(name);
        if let Some((row0, col0)) = values.start() {
            for (r, c, data) in values.used_cells() {
                let cell = cell_from_data(data);
                if cell != CellValue::Empty {
                    sheet.set(row0 as usize + r, col0 as usize + c, cell);
                }
            }
        }
        if let Some((row0, col0)) = formulas.start() {
            for (r, c, formula) in formulas.used_cells() {
                sheet.set(
                    row0 as usize + r,
                    col0 as usize + c,
                    CellValue::Formula(formula.clone()),
                );
            }
        }
        sheets.push(sheet);
    }
    Ok(sheets)
}

/// Data rows of a workbook's first sheet, header excluded. Rows are padded
/// to the header width and blank rows are dropped.
pub fn read_rows(path: &Path) -> ExportResult<Vec<Vec<CellValue>>> {
    let Some(first) = read_sheets(path)?.into_iter().next() else {
        return Ok(Vec::new());
    };

    let width = first.rows.iter().map(Vec::len).max().unwrap_or(0);
    let rows = first
        .rows
        .into_iter()
        .skip(1)
        .filter(|row| row.iter().any(|c| *c != CellValue::Empty))
        .map(|mut row| {
            row.resize(width, CellValue::Empty);
            row
        })
        .collect();
    Ok(rows)
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        other => CellValue::Text(other.to_string()),
    }
}

fn write_workbook(path: &Path, sheets: &[Sheet]) -> ExportResult<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let datetime_format = Format::new().set_num_format("dd/mm/yyyy hh:mm");

    for (idx, sheet) in sheets.iter().enumerate() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name.as_str())?;

        for (r, cells) in sheet.rows.iter().enumerate() {
            let row_num = r as u32;
            for (c, cell) in cells.iter().enumerate() {
                let col_num = c as u16;
                match cell {
                    CellValue::Text(s) if idx == 0 && r == 0 => {
                        worksheet.write_string_with_format(row_num, col_num, s, &header_format)?;
                    }
                    CellValue::Text(s) => {
                        worksheet.write_string(row_num, col_num, s)?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(row_num, col_num, *n)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row_num, col_num, *b)?;
                    }
                    CellValue::DateTime(serial) => {
                        let format = if serial.fract() == 0.0 {
                            &date_format
                        } else {
                            &datetime_format
                        };
                        worksheet.write_number_with_format(row_num, col_num, *serial, format)?;
                    }
                    CellValue::Formula(formula) => {
                        worksheet.write_formula(row_num, col_num, formula.as_str())?;
                    }
                    CellValue::Empty => {}
                }
            }
        }

        if idx == 0 {
            autosize_columns(worksheet, &sheet.rows)?;
        }
    }

    let bytes = workbook.save_to_buffer()?;
    fs::write(path, bytes).map_err(|e| classify_io_error(path, e))
}

/// Width of each used column: longest value plus two, capped.
fn autosize_columns(worksheet: &mut Worksheet, rows: &[Vec<CellValue>]) -> ExportResult<()> {
    let mut widths: Vec<usize> = Vec::new();
    for row in rows {
        if widths.len() < row.len() {
            widths.resize(row.len(), 0);
        }
        for (col, cell) in row.iter().enumerate() {
            widths[col] = widths[col].max(cell.display_len());
        }
    }
    for (col, width) in widths.iter().enumerate() {
        let width = (*width + 2).min(MAX_COLUMN_WIDTH);
        worksheet.set_column_width(col as u16, width as f64)?;
    }
    Ok(())
}

/// A workbook held open by a spreadsheet program cannot be opened for writing.
fn ensure_writable(path: &Path) -> ExportResult<()> {
    if !path.exists() {
        return Ok(());
    }
    OpenOptions::new()
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| classify_io_error(path, e))
}

/// Windows reports a file open in Excel as a sharing or lock violation
/// (ERROR_SHARING_VIOLATION = 32, ERROR_LOCK_VIOLATION = 33).
fn is_lock_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
        || (cfg!(windows) && matches!(err.raw_os_error(), Some(32 | 33)))
}

fn classify_io_error(path: &Path, err: io::Error) -> ExportError {
    if is_lock_error(&err) {
        tracing::warn!(path = %path.display(), "workbook is locked by another program");
        ExportError::WorkbookLocked(path.to_path_buf())
    } else {
        ExportError::Io(err)
    }
}
