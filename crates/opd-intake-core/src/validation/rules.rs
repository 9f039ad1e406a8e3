//! Field-level rules and validation errors.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Accepted body temperature range in °F, inclusive.
pub const TEMPERATURE_RANGE_F: (f64, f64) = (80.0, 110.0);

/// National ID: `12345-1234567-1` or 13 bare digits.
static CNIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{5}-\d{7}-\d|\d{13})$").unwrap());

/// Blood pressure as `systolic/diastolic`.
static BP_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2,3}/\d{2,3}$").unwrap());

/// A single rejected form field. Messages are shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Date must follow the DD/MM/YYYY format (e.g. 25/10/2025).")]
    Date,

    #[error("OPD number is required.")]
    OpdNo,

    #[error("Patient name is required.")]
    Name,

    #[error("Father / Husband name cannot be left blank.")]
    GuardianName,

    #[error("Please enter a valid age (positive whole number).")]
    Age,

    #[error("Age in months must be a whole number between 0 and 11.")]
    AgeMonths,

    #[error("Select Male or Female for sex.")]
    Gender,

    #[error("CNIC must be 13 digits (with or without dashes), e.g. 12345-1234567-1.")]
    Cnic,

    #[error("Address is required.")]
    Address,

    #[error("Temperature must be a numeric value.")]
    TemperatureNotNumeric,

    #[error("Temperature should be between 80°F and 110°F.")]
    TemperatureOutOfRange,

    #[error("Blood pressure must follow the systolic/diastolic format (e.g. 120/80).")]
    BloodPressure,

    #[error("Weight must be a positive number if provided.")]
    Weight,

    #[error("Diabetic reading must be a positive number if provided.")]
    Diabetic,

    #[error("Select a fees type (Normal or Urgent).")]
    FeeType,
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Date => "date",
            ValidationError::OpdNo => "opd_no",
            ValidationError::Name => "name",
            ValidationError::GuardianName => "guardian_name",
            ValidationError::Age | ValidationError::AgeMonths => "age",
            ValidationError::Gender => "gender",
            ValidationError::Cnic => "cnic",
            ValidationError::Address => "address",
            ValidationError::TemperatureNotNumeric | ValidationError::TemperatureOutOfRange => {
                "temperature"
            }
            ValidationError::BloodPressure => "blood_pressure",
            ValidationError::Weight => "weight",
            ValidationError::Diabetic => "diabetic",
            ValidationError::FeeType => "fee",
        }
    }
}

pub fn is_valid_cnic(value: &str) -> bool {
    CNIC_PATTERN.is_match(value)
}

pub fn is_valid_blood_pressure(value: &str) -> bool {
    BP_PATTERN.is_match(value)
}

/// Parse an optional positive measurement. Blank input means "not recorded".
pub(crate) fn parse_optional_positive(value: &str) -> Result<Option<f64>, ()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(Some(v)),
        _ => Err(()),
    }
}
