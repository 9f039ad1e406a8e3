//! Raw intake form and its conversion into a visit record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rules::{
    is_valid_blood_pressure, is_valid_cnic, parse_optional_positive, ValidationError,
    TEMPERATURE_RANGE_F,
};
use crate::models::{FeeType, Gender, VisitRecord, DISPLAY_DATE_FORMAT};

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Intake form as typed by clinic staff. Every field is raw text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VisitForm {
    /// `DD/MM/YYYY`
    pub date: String,
    pub opd_no: String,
    pub name: String,
    pub guardian_name: String,
    pub age_years: String,
    pub age_months: String,
    pub gender: String,
    pub cnic: String,
    pub address: String,
    pub temperature: String,
    pub blood_pressure: String,
    pub weight: String,
    pub diabetic: String,
    pub fee: String,
}

impl VisitForm {
    /// A fresh form with the clinic's usual defaults filled in.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today.format(DISPLAY_DATE_FORMAT).to_string(),
            gender: Gender::Female.as_str().to_string(),
            temperature: "98.6".to_string(),
            blood_pressure: "120/80".to_string(),
            fee: FeeType::Normal.as_str().to_string(),
            ..Default::default()
        }
    }

    /// Validate every field in form order, stopping at the first failure.
    pub fn validate(&self) -> ValidationResult<VisitRecord> {
        let date = NaiveDate::parse_from_str(self.date.trim(), DISPLAY_DATE_FORMAT)
            .map_err(|_| ValidationError::Date)?;

        let opd_no = required(&self.opd_no, ValidationError::OpdNo)?;
        let name = required(&self.name, ValidationError::Name)?;
        let guardian_name = required(&self.guardian_name, ValidationError::GuardianName)?;

        let (age_years, age_months) = self.parse_age()?;

        let gender = self
            .gender
            .parse::<Gender>()
            .map_err(|_| ValidationError::Gender)?;

        let cnic = self.cnic.trim();
        if !cnic.is_empty() && !is_valid_cnic(cnic) {
            return Err(ValidationError::Cnic);
        }

        let address = required(&self.address, ValidationError::Address)?;

        let temperature_f = self
            .temperature
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::TemperatureNotNumeric)?;
        let (min_temp, max_temp) = TEMPERATURE_RANGE_F;
        if !(min_temp..=max_temp).contains(&temperature_f) {
            return Err(ValidationError::TemperatureOutOfRange);
        }

        let blood_pressure = self.blood_pressure.trim();
        if !is_valid_blood_pressure(blood_pressure) {
            return Err(ValidationError::BloodPressure);
        }

        let weight_kg = parse_optional_positive(&self.weight).map_err(|_| ValidationError::Weight)?;
        let diabetic_mg_dl =
            parse_optional_positive(&self.diabetic).map_err(|_| ValidationError::Diabetic)?;

        let fee = self
            .fee
            .parse::<FeeType>()
            .map_err(|_| ValidationError::FeeType)?;

        Ok(VisitRecord {
            id: None,
            date,
            opd_no,
            name,
            guardian_name,
            age_years,
            age_months,
            gender,
            cnic: (!cnic.is_empty()).then(|| cnic.to_string()),
            address,
            temperature_f,
            blood_pressure: blood_pressure.to_string(),
            weight_kg,
            diabetic_mg_dl,
            fee,
        })
    }

    /// Years must be positive unless the patient is an infant with months recorded.
    fn parse_age(&self) -> ValidationResult<(u32, Option<u32>)> {
        let years = self
            .age_years
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::Age)?;

        let months_raw = self.age_months.trim();
        let months = if months_raw.is_empty() {
            None
        } else {
            match months_raw.parse::<u32>() {
                Ok(m) if m <= 11 => Some(m),
                _ => return Err(ValidationError::AgeMonths),
            }
        };

        if years == 0 && months.unwrap_or(0) == 0 {
            return Err(ValidationError::Age);
        }

        Ok((years, months))
    }
}

impl From<&VisitRecord> for VisitForm {
    fn from(record: &VisitRecord) -> Self {
        Self {
            date: record.display_date(),
            opd_no: record.opd_no.clone(),
            name: record.name.clone(),
            guardian_name: record.guardian_name.clone(),
            age_years: record.age_years.to_string(),
            age_months: record.age_months.map(|m| m.to_string()).unwrap_or_default(),
            gender: record.gender.as_str().to_string(),
            cnic: record.cnic.clone().unwrap_or_default(),
            address: record.address.clone(),
            temperature: record.temperature_f.to_string(),
            blood_pressure: record.blood_pressure.clone(),
            weight: record.weight_kg.map(|w| w.to_string()).unwrap_or_default(),
            diabetic: record.diabetic_mg_dl.map(|d| d.to_string()).unwrap_or_default(),
            fee: record.fee.as_str().to_string(),
        }
    }
}

fn required(value: &str, err: ValidationError) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(err)
    } else {
        Ok(trimmed.to_string())
    }
}
