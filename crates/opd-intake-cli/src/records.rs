//! # Record Subcommands
//!
//! Listing saved visits and regenerating a visit's printable report.

use std::io::Write;

use chrono::{Datelike, NaiveDate};
use clap::Args;
use opd_intake_core::{Clinic, VisitRecord};

use crate::open::open_path;

/// A calendar month given as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

/// clap value parser for `YYYY-MM`.
pub fn parse_month(value: &str) -> Result<Month, String> {
    let invalid = || format!("'{value}' is not a month (expected YYYY-MM)");
    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let month = Month {
        year: year.parse().map_err(|_| invalid())?,
        month: month.parse().map_err(|_| invalid())?,
    };
    month.first_day().ok_or_else(invalid)?;
    Ok(month)
}

/// Arguments for the list subcommand.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only visits in this month (YYYY-MM).
    #[arg(long, value_parser = parse_month)]
    pub month: Option<Month>,

    /// Print the records as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the report subcommand.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Visit id as shown by `list`.
    pub id: i64,

    /// Open the report once it is written.
    #[arg(long)]
    pub open: bool,
}

pub fn run_list(clinic: &Clinic, args: &ListArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let visits = match args.month {
        Some(m) => clinic.visits_in_month(m.year, m.month)?,
        None => clinic.visits()?,
    };

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &visits)?;
        writeln!(out)?;
        return Ok(());
    }

    if visits.is_empty() {
        writeln!(out, "No visits saved.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:>5}  {:<10}  {:<10}  {:<24}  {:<16}  {:<6}",
        "ID", "Date", "OPD No", "Patient", "Age", "Fee"
    )?;
    for visit in &visits {
        writeln!(out, "{}", list_line(visit))?;
    }
    writeln!(out, "{} visit(s)", visits.len())?;
    Ok(())
}

fn list_line(visit: &VisitRecord) -> String {
    format!(
        "{:>5}  {:<10}  {:<10}  {:<24}  {:<16}  {:<6}",
        visit.id.unwrap_or_default(),
        visit.display_date(),
        visit.opd_no,
        visit.name,
        visit.age_display(),
        visit.fee.as_str()
    )
}

pub fn run_report(clinic: &Clinic, args: &ReportArgs) -> anyhow::Result<()> {
    let path = clinic.generate_report_for(args.id)?;
    println!("Report: {}", path.display());
    if args.open {
        open_path(&path)?;
    }
    Ok(())
}
