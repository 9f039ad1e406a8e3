//! Printable A5 visit report via `printpdf`.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::*;
use serde::{Deserialize, Serialize};

use super::naming::{month_folder_name, sanitize_filename};
use super::{ExportError, ExportResult};
use crate::models::{FeeType, VisitRecord};

const PAGE_WIDTH: f32 = 148.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const INNER: f32 = 15.0;
const LEFT_COLUMN: f32 = 38.0;
const BOTTOM_RULE: f32 = 16.0;

/// Placeholder printed for values that were not recorded.
pub const MISSING_VALUE: &str = "-";

/// A doctor named on the letterhead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub name: String,
    pub qualifications: String,
}

/// Clinic details printed on every report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Letterhead {
    pub name: String,
    pub subtitle: Option<String>,
    /// At most two are printed, left and right
    pub doctors: Vec<Doctor>,
    pub footer_days: String,
    pub footer_time: String,
    pub footer_sunday_hours: String,
    pub footer_credit: Option<String>,
}

impl Default for Letterhead {
    fn default() -> Self {
        Self {
            name: "Community Clinic".to_string(),
            subtitle: None,
            doctors: Vec::new(),
            footer_days: "Monday to Saturday".to_string(),
            footer_time: "Time: 04 P.M to 10 P.M".to_string(),
            footer_sunday_hours: "Sunday Time: 10 A.M to 10 P.M".to_string(),
            footer_credit: None,
        }
    }
}

/// A labelled value placed on the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportField {
    pub label: &'static str,
    pub value: String,
}

fn field(label: &'static str, value: impl Into<String>) -> ReportField {
    ReportField {
        label,
        value: value.into(),
    }
}

fn or_missing(value: &str) -> String {
    if value.trim().is_empty() {
        MISSING_VALUE.to_string()
    } else {
        value.to_string()
    }
}

/// Patient details in the order they appear at the top of the page.
///
/// Values are returned as recorded. When drawn, characters the builtin PDF
/// fonts cannot show are folded to ASCII (see [`printable_text`]).
pub fn report_fields(record: &VisitRecord) -> Vec<ReportField> {
    vec![
        field("Date", record.display_date()),
        field("OPD No", or_missing(&record.opd_no)),
        field("Patient Name", record.name.clone()),
        field("Father / Husband Name", or_missing(&record.guardian_name)),
        field("Age", record.age_display()),
        field("Sex", record.gender.as_str()),
        field("CNIC (if available)", or_missing(record.cnic.as_deref().unwrap_or(""))),
        field("Address", or_missing(&record.single_line_address())),
        field("Type of Fees", record.fee.label()),
    ]
}

/// Vitals column. Pulse and SPO2 are left blank for the doctor to fill in.
pub fn report_vitals(record: &VisitRecord) -> Vec<ReportField> {
    vec![
        field("Temp", format!("{} F", record.temperature_f)),
        field("Pulse", ""),
        field("B.P", record.blood_pressure.clone()),
        field("SPO2", ""),
        field(
            "Wt",
            record.weight_kg.map(|w| format!("{w} kg")).unwrap_or_default(),
        ),
        field(
            "RBS",
            record.diabetic_mg_dl.map(|d| d.to_string()).unwrap_or_default(),
        ),
    ]
}

/// `<reports_dir>/<YYYY_MM>/<name>_<YYYYMMDD>_<opd_no>.pdf`
pub fn report_path(reports_dir: &Path, record: &VisitRecord) -> PathBuf {
    let file_name = format!(
        "{}_{}_{}.pdf",
        sanitize_filename(&record.name),
        record.date.format("%Y%m%d"),
        sanitize_filename(&record.opd_no)
    );
    reports_dir.join(month_folder_name(record.date)).join(file_name)
}

/// Writes one-page visit reports.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    reports_dir: PathBuf,
    letterhead: Letterhead,
}

impl ReportWriter {
    pub fn new(reports_dir: impl Into<PathBuf>, letterhead: Letterhead) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            letterhead,
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Render the report for `record` and return where it was written.
    pub fn generate(&self, record: &VisitRecord) -> ExportResult<PathBuf> {
        let path = report_path(&self.reports_dir, record);
        if let Some(month_dir) = path.parent() {
            fs::create_dir_all(month_dir)?;
        }

        let bytes = self.render(record)?;
        fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), opd_no = %record.opd_no, "generated visit report");
        Ok(path)
    }

    /// Render the report to PDF bytes.
    pub fn render(&self, record: &VisitRecord) -> ExportResult<Vec<u8>> {
        let title = format!("Visit Report - {}", record.name);
        let (doc, page1, layer1) =
            PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let page = Page {
            layer: doc.get_page(page1).get_layer(layer1),
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
            symbols: doc.add_builtin_font(BuiltinFont::ZapfDingbats).map_err(pdf_error)?,
        };

        let y = self.draw_letterhead(&page);
        let y = draw_patient_details(&page, record, y);
        let y = draw_fees(&page, record.fee, y);
        self.draw_body(&page, record, y);

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf).map_err(pdf_error)?;
        buf.into_inner()
            .map_err(|e| ExportError::Pdf(format!("PDF buffer error: {e}")))
    }

    fn draw_letterhead(&self, page: &Page) -> f32 {
        let lh = &self.letterhead;
        let mut y = PAGE_HEIGHT - 10.0;
        page.centred(&lh.name, 15.0, y, true);

        if let Some(subtitle) = lh.subtitle.as_deref().filter(|s| !s.is_empty()) {
            y -= 4.0;
            page.centred(&format!("({subtitle})"), 10.0, y, false);
        }
        y -= 6.0;

        if let Some(left) = lh.doctors.first() {
            page.text(&left.name, 10.0, INNER, y, true);
            page.text(&left.qualifications, 9.0, INNER, y - 4.2, false);
            if let Some(right) = lh.doctors.get(1) {
                page.right(&right.name, 10.0, PAGE_WIDTH - INNER, y, true);
                page.right(&right.qualifications, 9.0, PAGE_WIDTH - INNER, y - 4.2, false);
            }
            y -= 11.0;
        } else {
            y -= 6.0;
        }
        y
    }

    fn draw_body(&self, page: &Page, record: &VisitRecord, y: f32) {
        let mut y = y - 7.0;
        page.text("Diagnosis", 11.0, PAGE_WIDTH / 3.0 + 2.0, y, true);
        y -= 1.2;
        page.rule(0.0, y, PAGE_WIDTH, y);

        let body_top = y - 1.8;
        let body_bottom = BOTTOM_RULE + 1.0;
        page.rule(LEFT_COLUMN, body_bottom, LEFT_COLUMN, body_top);

        let col_x = 6.0;
        let follow_up_y = body_top - 4.0;
        page.text("Follow-Up:", 10.0, col_x, follow_up_y, true);
        page.text("Treatment:", 10.0, LEFT_COLUMN + 2.0, follow_up_y, true);

        let vitals_y = follow_up_y - 11.0;
        page.text("VITALS", 10.0, col_x, vitals_y, true);

        let rows = report_vitals(record);
        let available = vitals_y - 8.0 - (body_bottom + 6.0);
        let gap = (available / rows.len() as f32).min(16.0);
        let line_start = col_x + 2.0;
        let line_end = LEFT_COLUMN - 2.0;

        let mut row_y = vitals_y - 8.0;
        for vital in &rows {
            page.text(&format!("{}:", vital.label), 9.0, line_start, row_y, true);
            page.rule(line_start + 12.0, row_y - 0.7, line_end, row_y - 0.7);
            if !vital.value.is_empty() {
                page.text(&vital.value, 9.0, line_start + 12.7, row_y, false);
            }
            row_y -= gap;
        }
        page.text("H/O:", 9.0, line_start, row_y, true);

        page.rule(0.0, BOTTOM_RULE, PAGE_WIDTH, BOTTOM_RULE);

        let lh = &self.letterhead;
        let footer_y = BOTTOM_RULE - 4.2;
        page.text(
            &format!("{}    {}", lh.footer_days, lh.footer_time),
            8.0,
            MARGIN,
            footer_y,
            true,
        );
        page.right(&lh.footer_sunday_hours, 8.0, PAGE_WIDTH - MARGIN, footer_y, true);
        if let Some(credit) = lh.footer_credit.as_deref().filter(|s| !s.is_empty()) {
            page.centred(credit, 7.0, footer_y - 4.6, false);
        }
    }
}

fn draw_patient_details(page: &Page, record: &VisitRecord, y: f32) -> f32 {
    let fields = report_fields(record);
    let value_of = |label: &str| {
        fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
            .unwrap_or(MISSING_VALUE)
    };

    let mut y = y;
    page.label_value(INNER, y, "Date", value_of("Date"));
    page.label_value_right(PAGE_WIDTH - INNER, y, "OPD No", value_of("OPD No"));
    y -= 5.0;

    page.label_value(INNER, y, "Patient Name", value_of("Patient Name"));
    y -= 3.9;
    page.label_value(INNER, y, "Father / Husband Name", value_of("Father / Husband Name"));
    y -= 3.9;
    page.label_value(INNER, y, "Age", value_of("Age"));
    page.label_value_right(PAGE_WIDTH - INNER - 6.0, y, "Sex", value_of("Sex"));
    y -= 3.9;
    page.label_value(INNER, y, "CNIC (if available)", value_of("CNIC (if available)"));
    y -= 3.9;

    let address = value_of("Address");
    let lines = wrap_text(address, 70);
    for (idx, line) in lines.iter().enumerate() {
        if idx == 0 {
            page.label_value(INNER, y, "Address", line);
        } else {
            page.text(line, 9.5, INNER + 16.0, y, false);
        }
        y -= 3.9;
    }
    y - 1.0
}

fn draw_fees(page: &Page, chosen: FeeType, y: f32) -> f32 {
    let label = "Type of Fees:";
    page.text(label, 9.5, INNER, y, true);

    let mut x = INNER + text_width(label, 9.5, true) + 3.5;
    for (idx, fee) in FeeType::ALL.iter().enumerate() {
        let text = fee.label();
        let width = text_width(&text, 9.5, true);
        if idx > 0 {
            x = PAGE_WIDTH - INNER - width - 7.0;
        }
        page.text(&text, 9.5, x, y, true);
        if *fee == chosen {
            page.check_mark(x + width + 2.8, y);
        }
    }
    y - 3.2
}

/// Approximate rendered width in mm. Builtin fonts carry no metrics here, so
/// an average Helvetica glyph width is used.
fn text_width(text: &str, size_pt: f32, bold: bool) -> f32 {
    let em = if bold { 0.56 } else { 0.52 };
    text.chars().count() as f32 * size_pt * em * 0.3528
}

/// Greedy word wrap to at most `max_chars` per line.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Text the builtin fonts can draw: accented Latin letters lose their accent
/// and any other non-ASCII character becomes `?`.
fn printable_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c,
            '\t' | '\n' | '\r' => ' ',
            'À'..='Å' => 'A',
            'à'..='å' => 'a',
            'Ç' => 'C',
            'ç' => 'c',
            'È'..='Ë' => 'E',
            'è'..='ë' => 'e',
            'Ì'..='Ï' => 'I',
            'ì'..='ï' => 'i',
            'Ñ' => 'N',
            'ñ' => 'n',
            'Ò'..='Ö' | 'Ø' => 'O',
            'ò'..='ö' | 'ø' => 'o',
            'Ù'..='Ü' => 'U',
            'ù'..='ü' => 'u',
            'Ý' => 'Y',
            'ý' | 'ÿ' => 'y',
            _ => '?',
        })
        .collect()
}

fn pdf_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(e.to_string())
}

struct Page {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    symbols: IndirectFontRef,
}

impl Page {
    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool) {
        self.layer
            .use_text(printable_text(text), size, Mm(x), Mm(y), self.font(bold));
    }

    fn centred(&self, text: &str, size: f32, y: f32, bold: bool) {
        let x = ((PAGE_WIDTH - text_width(text, size, bold)) / 2.0).max(0.0);
        self.text(text, size, x, y, bold);
    }

    fn right(&self, text: &str, size: f32, right_x: f32, y: f32, bold: bool) {
        let x = (right_x - text_width(text, size, bold)).max(0.0);
        self.text(text, size, x, y, bold);
    }

    fn label_value(&self, x: f32, y: f32, label: &str, value: &str) {
        let label = format!("{label}:");
        self.text(&label, 9.5, x, y, true);
        self.text(value, 9.5, x + text_width(&label, 9.5, true) + 1.4, y, false);
    }

    fn label_value_right(&self, right_x: f32, y: f32, label: &str, value: &str) {
        let label = format!("{label}:");
        let value_width = text_width(value, 9.5, false);
        let label_width = text_width(&label, 9.5, true);
        let start = right_x - (label_width + 1.4 + value_width);
        self.text(&label, 9.5, start, y, true);
        self.text(value, 9.5, start + label_width + 1.4, y, false);
    }

    /// ZapfDingbats `4` is a heavy check mark.
    fn check_mark(&self, x: f32, y: f32) {
        self.layer.use_text("4", 12.0, Mm(x), Mm(y), &self.symbols);
    }

    fn rule(&self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.layer.set_outline_thickness(1.0);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y1)), false),
                (Point::new(Mm(x2), Mm(y2)), false),
            ],
            is_closed: false,
        });
    }
}
