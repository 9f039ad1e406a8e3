//! # Visit Entry Subcommands
//!
//! `new` walks through the intake form on the terminal. `add` takes every
//! field as a flag for scripted entry.

use std::io::{BufRead, Write};

use clap::Args;
use opd_intake_core::{Clinic, ClinicError, VisitForm, VisitRecord};

use crate::open::open_path;
use crate::prompt::{Prompter, CLEAR_VALUE};

/// Arguments for the new subcommand.
#[derive(Args, Debug, Default)]
pub struct NewArgs {
    /// Generate the printable report without asking.
    #[arg(long)]
    pub report: bool,

    /// Open the report once it is written.
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the add subcommand.
#[derive(Args, Debug, Default)]
pub struct AddArgs {
    /// Visit date as DD/MM/YYYY. Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub opd_no: String,

    /// Patient name.
    #[arg(long)]
    pub name: String,

    /// Father or husband name.
    #[arg(long)]
    pub guardian: String,

    /// Age in whole years.
    #[arg(long)]
    pub age: String,

    /// Additional months, 0 to 11.
    #[arg(long, default_value = "")]
    pub months: String,

    #[arg(long, default_value = "Female")]
    pub gender: String,

    #[arg(long, default_value = "")]
    pub cnic: String,

    #[arg(long)]
    pub address: String,

    /// Temperature in °F.
    #[arg(long, default_value = "98.6")]
    pub temperature: String,

    #[arg(long, default_value = "120/80")]
    pub bp: String,

    /// Weight in kg.
    #[arg(long, default_value = "")]
    pub weight: String,

    /// Random blood sugar in mg/dl.
    #[arg(long, default_value = "")]
    pub diabetic: String,

    /// Normal or Urgent.
    #[arg(long, default_value = "Normal")]
    pub fee: String,

    /// Also generate the printable report.
    #[arg(long)]
    pub report: bool,

    /// Open the report once it is written.
    #[arg(long)]
    pub open: bool,
}

impl AddArgs {
    pub fn to_form(&self, today: chrono::NaiveDate) -> VisitForm {
        let defaults = VisitForm::new(today);
        VisitForm {
            date: self.date.clone().unwrap_or(defaults.date),
            opd_no: self.opd_no.clone(),
            name: self.name.clone(),
            guardian_name: self.guardian.clone(),
            age_years: self.age.clone(),
            age_months: self.months.clone(),
            gender: self.gender.clone(),
            cnic: self.cnic.clone(),
            address: self.address.clone(),
            temperature: self.temperature.clone(),
            blood_pressure: self.bp.clone(),
            weight: self.weight.clone(),
            diabetic: self.diabetic.clone(),
            fee: self.fee.clone(),
        }
    }
}

/// Run the interactive form until a visit is saved.
pub fn run_new<R: BufRead, W: Write>(
    clinic: &mut Clinic,
    args: &NewArgs,
    prompter: &mut Prompter<R, W>,
    today: chrono::NaiveDate,
) -> anyhow::Result<VisitRecord> {
    prompter.say(format!(
        "New OPD visit. Press Enter to keep a value, '{CLEAR_VALUE}' to clear it."
    ))?;

    let mut form = VisitForm::new(today);
    let record = loop {
        prompter.fill_form(&mut form)?;
        match clinic.submit(&form) {
            Ok(record) => break record,
            Err(ClinicError::Validation(e)) => {
                tracing::debug!(field = e.field(), "form rejected");
                prompter.say(format!("Validation error: {e}"))?;
            }
            Err(e) => return Err(e.into()),
        }
    };

    prompter.say(saved_message(&record))?;

    let wants_report = args.report || prompter.confirm("Generate printable report?", false)?;
    if wants_report {
        let path = clinic.generate_report(&record)?;
        prompter.say(format!("Report: {}", path.display()))?;
        if args.open {
            open_path(&path)?;
        }
    }
    Ok(record)
}

/// Save one visit from command-line flags.
pub fn run_add(
    clinic: &mut Clinic,
    args: &AddArgs,
    today: chrono::NaiveDate,
) -> anyhow::Result<VisitRecord> {
    let record = clinic.submit(&args.to_form(today))?;
    println!("{}", saved_message(&record));

    if args.report {
        let path = clinic.generate_report(&record)?;
        println!("Report: {}", path.display());
        if args.open {
            open_path(&path)?;
        }
    }
    Ok(record)
}

fn saved_message(record: &VisitRecord) -> String {
    format!(
        "Saved visit {} (OPD {}) for {} on {}",
        record.id.unwrap_or_default(),
        record.opd_no,
        record.name,
        record.display_date()
    )
}
