//! Fixed-choice form fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Patient sex as recorded on the intake form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Stored and displayed form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{other}'")),
        }
    }
}

/// Consultation fee category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum FeeType {
    #[default]
    Normal,
    Urgent,
}

impl FeeType {
    /// All categories, in the order they appear on the form and the report.
    pub const ALL: [FeeType; 2] = [FeeType::Normal, FeeType::Urgent];

    /// Stored form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Normal => "Normal",
            FeeType::Urgent => "Urgent",
        }
    }

    /// Fee in rupees.
    pub fn amount(&self) -> u32 {
        match self {
            FeeType::Normal => 100,
            FeeType::Urgent => 200,
        }
    }

    /// Human-readable label used in workbooks and reports.
    pub fn label(&self) -> String {
        format!("{} - Rs. {}", self.as_str(), self.amount())
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the display label too ("Urgent - Rs. 200")
        let key = s.split_once(" - ").map_or(s, |(key, _)| key);
        match key.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(FeeType::Normal),
            "urgent" => Ok(FeeType::Urgent),
            other => Err(format!("unknown fee type '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_labels() {
        assert_eq!(FeeType::Normal.label(), "Normal - Rs. 100");
        assert_eq!(FeeType::Urgent.label(), "Urgent - Rs. 200");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("URGENT".parse::<FeeType>().unwrap(), FeeType::Urgent);
        assert_eq!(" female ".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("m".parse::<Gender>().unwrap(), Gender::Male);
        assert!("other".parse::<Gender>().is_err());
        assert!("free".parse::<FeeType>().is_err());
    }

    #[test]
    fn test_parse_fee_label() {
        for fee in FeeType::ALL {
            assert_eq!(fee.label().parse::<FeeType>().unwrap(), fee);
        }
    }
}
