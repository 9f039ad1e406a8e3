//! File and folder naming for monthly outputs.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Prefix shared by every monthly workbook.
pub const WORKBOOK_PREFIX: &str = "ClinicData";

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

/// `ClinicData_October2025.xlsx`
pub fn workbook_file_name(date: NaiveDate) -> String {
    format!("{WORKBOOK_PREFIX}_{}.xlsx", date.format("%B%Y"))
}

/// Sheet title inside a monthly workbook, e.g. `October 2025`.
pub fn workbook_sheet_name(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Per-month report folder name, e.g. `2025_10`.
pub fn month_folder_name(date: NaiveDate) -> String {
    date.format("%Y_%m").to_string()
}

/// Filesystem-safe form of a name or visit number.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(name.trim(), "_");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "record".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_names() {
        let date = ymd(2025, 10, 25);
        assert_eq!(workbook_file_name(date), "ClinicData_October2025.xlsx");
        assert_eq!(workbook_sheet_name(date), "October 2025");
        assert_eq!(month_folder_name(date), "2025_10");
        assert_eq!(month_folder_name(ymd(2026, 1, 3)), "2026_01");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("John Doe"), "John_Doe");
        assert_eq!(sanitize_filename("  Ali / Khan?? "), "Ali_Khan");
        assert_eq!(sanitize_filename("OPD-001"), "OPD-001");
        assert_eq!(sanitize_filename("..hidden.."), "hidden");
        assert_eq!(sanitize_filename("///"), "record");
        assert_eq!(sanitize_filename(""), "record");
    }
}
