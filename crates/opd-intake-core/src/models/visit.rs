//! Visit record model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::choices::{FeeType, Gender};

/// Display format for visit dates on forms, workbooks and reports.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Storage format for visit dates in the database.
pub const STORAGE_DATE_FORMAT: &str = "%Y-%m-%d";

/// One patient's vitals for a single clinic visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitRecord {
    /// Database row id, `None` until inserted
    pub id: Option<i64>,
    /// Visit date
    pub date: NaiveDate,
    /// OPD (outpatient) visit number
    pub opd_no: String,
    /// Patient name
    pub name: String,
    /// Father or husband name
    pub guardian_name: String,
    /// Age in whole years
    pub age_years: u32,
    /// Additional months, for infants and young children
    pub age_months: Option<u32>,
    pub gender: Gender,
    /// National identity card number
    pub cnic: Option<String>,
    /// Free-form address, may span several lines
    pub address: String,
    /// Body temperature in °F
    pub temperature_f: f64,
    /// Blood pressure as `systolic/diastolic`
    pub blood_pressure: String,
    pub weight_kg: Option<f64>,
    /// Random blood sugar in mg/dl
    pub diabetic_mg_dl: Option<f64>,
    pub fee: FeeType,
}

impl VisitRecord {
    /// Visit date as `DD/MM/YYYY`.
    pub fn display_date(&self) -> String {
        self.date.format(DISPLAY_DATE_FORMAT).to_string()
    }

    /// Age as printed on the report, e.g. `2 years 5 months`.
    pub fn age_display(&self) -> String {
        match self.age_months {
            Some(months) if months > 0 => format!("{} years {} months", self.age_years, months),
            _ => format!("{} years", self.age_years),
        }
    }

    /// Address with line breaks folded into `, ` for single-line cells.
    pub fn single_line_address(&self) -> String {
        self.address
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> VisitRecord {
        VisitRecord {
            id: None,
            date: NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
            opd_no: "OPD-001".into(),
            name: "Ayesha Khan".into(),
            guardian_name: "Imran Khan".into(),
            age_years: 2,
            age_months: Some(5),
            gender: Gender::Female,
            cnic: None,
            address: "House 12\n  Main Road\n".into(),
            temperature_f: 98.6,
            blood_pressure: "120/80".into(),
            weight_kg: Some(12.5),
            diabetic_mg_dl: None,
            fee: FeeType::Normal,
        }
    }

    #[test]
    fn test_display_date() {
        assert_eq!(record().display_date(), "25/10/2025");
    }

    #[test]
    fn test_age_display() {
        let mut r = record();
        assert_eq!(r.age_display(), "2 years 5 months");
        r.age_months = Some(0);
        assert_eq!(r.age_display(), "2 years");
        r.age_months = None;
        assert_eq!(r.age_display(), "2 years");
    }

    #[test]
    fn test_single_line_address() {
        assert_eq!(record().single_line_address(), "House 12, Main Road");
    }
}
