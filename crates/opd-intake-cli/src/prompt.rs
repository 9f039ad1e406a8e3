//! # Terminal Prompts
//!
//! Line-based questions with defaults. Reads from any `BufRead` and writes to
//! any `Write` so the interactive form can be driven from tests.

use std::io::{self, BufRead, Write};

use opd_intake_core::models::FeeType;
use opd_intake_core::VisitForm;

/// Typing this at a prompt clears a previously entered value.
pub const CLEAR_VALUE: &str = "-";

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask one question. An empty answer keeps `default`.
    pub fn ask(&mut self, label: &str, default: &str) -> io::Result<String> {
        if default.is_empty() {
            write!(self.output, "{label}: ")?;
        } else {
            write!(self.output, "{label} [{default}]: ")?;
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before the form was complete",
            ));
        }

        let answer = line.trim();
        Ok(match answer {
            "" => default.to_string(),
            CLEAR_VALUE => String::new(),
            _ => answer.to_string(),
        })
    }

    /// Yes/no question.
    pub fn confirm(&mut self, label: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = self.ask(&format!("{label} ({hint})"), "")?;
            match answer.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    /// Walk through every form field, offering the current values as defaults.
    pub fn fill_form(&mut self, form: &mut VisitForm) -> io::Result<()> {
        form.date = self.ask("Date (DD/MM/YYYY)", &form.date)?;
        form.opd_no = self.ask("OPD No", &form.opd_no)?;
        form.name = self.ask("Patient Name", &form.name)?;
        form.guardian_name = self.ask("Father/Husband Name", &form.guardian_name)?;
        form.age_years = self.ask("Age (years)", &form.age_years)?;
        form.age_months = self.ask("Age (months, optional)", &form.age_months)?;
        form.gender = self.ask("Gender (Male/Female)", &form.gender)?;
        form.cnic = self.ask("CNIC (optional)", &form.cnic)?;
        form.address = self.ask("Address", &form.address)?;
        form.temperature = self.ask("Temperature (F)", &form.temperature)?;
        form.blood_pressure = self.ask("Blood Pressure", &form.blood_pressure)?;
        form.weight = self.ask("Weight kg (optional)", &form.weight)?;
        form.diabetic = self.ask("Diabetic mg/dl (optional)", &form.diabetic)?;

        let choices = FeeType::ALL
            .iter()
            .map(|fee| fee.label())
            .collect::<Vec<_>>()
            .join(", ");
        form.fee = self.ask(&format!("Fees Type ({choices})"), &form.fee)?;
        Ok(())
    }

    /// Print a line to the prompt output.
    pub fn say(&mut self, message: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }
}
