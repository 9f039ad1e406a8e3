//! Visit record database operations.

use chrono::{Datelike, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{FeeType, Gender, VisitRecord, STORAGE_DATE_FORMAT};

const VISIT_COLUMNS: &str = "id, date, opd_no, name, father_name, age, age_months, gender, \
                             cnic, address, temperature, bp, weight, diabetic, fees_type";

/// Insert on any connection, including an open transaction. Returns the new row id.
pub fn insert_visit_on(conn: &Connection, visit: &VisitRecord) -> DbResult<i64> {
    conn.execute(
        r#"
        INSERT INTO patients (
            date, opd_no, name, father_name, age, age_months, gender,
            cnic, address, temperature, bp, weight, diabetic, fees_type
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
        params![
            visit.date.format(STORAGE_DATE_FORMAT).to_string(),
            visit.opd_no,
            visit.name,
            visit.guardian_name,
            visit.age_years,
            visit.age_months,
            visit.gender.as_str(),
            visit.cnic,
            visit.address,
            visit.temperature_f,
            visit.blood_pressure,
            visit.weight_kg,
            visit.diabetic_mg_dl,
            visit.fee.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Insert a new visit and return its row id.
    pub fn insert_visit(&self, visit: &VisitRecord) -> DbResult<i64> {
        insert_visit_on(&self.conn, visit)
    }

    /// Get a visit by row id.
    pub fn get_visit(&self, id: i64) -> DbResult<Option<VisitRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {VISIT_COLUMNS} FROM patients WHERE id = ?"),
                [id],
                visit_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All visits, most recent first.
    pub fn list_visits(&self) -> DbResult<Vec<VisitRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VISIT_COLUMNS} FROM patients ORDER BY date DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], visit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Visits with `start <= date < end`, most recent first.
    pub fn list_visits_between(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<VisitRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {VISIT_COLUMNS} FROM patients
            WHERE date >= ?1 AND date < ?2
            ORDER BY date DESC, id DESC
            "#
        ))?;
        let rows = stmt.query_map(
            params![
                start.format(STORAGE_DATE_FORMAT).to_string(),
                end.format(STORAGE_DATE_FORMAT).to_string(),
            ],
            visit_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Visits in one calendar month.
    pub fn list_visits_in_month(&self, year: i32, month: u32) -> DbResult<Vec<VisitRecord>> {
        let invalid = || DbError::InvalidMonth { year, month };
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let end = if start.month() == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(invalid)?;
        self.list_visits_between(start, end)
    }

    /// Total number of stored visits.
    pub fn count_visits(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn conversion_error(idx: usize, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, reason.into())
}

/// Dates are `YYYY-MM-DD`; older rows may carry a `THH:MM:SS` suffix.
fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10)?;
    NaiveDate::parse_from_str(date_part, STORAGE_DATE_FORMAT).ok()
}

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<VisitRecord> {
    let raw_date: String = row.get(1)?;
    let date = parse_stored_date(&raw_date)
        .ok_or_else(|| conversion_error(1, format!("unrecognised date '{raw_date}'")))?;

    let gender: String = row.get(7)?;
    let gender = gender.parse::<Gender>().map_err(|e| conversion_error(7, e))?;

    let fee = match row.get::<_, Option<String>>(14)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.parse::<FeeType>().map_err(|e| conversion_error(14, e))?
        }
        _ => FeeType::Normal,
    };

    Ok(VisitRecord {
        id: Some(row.get(0)?),
        date,
        opd_no: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        name: row.get(3)?,
        guardian_name: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        age_years: row.get(5)?,
        age_months: row.get(6)?,
        gender,
        cnic: row
            .get::<_, Option<String>>(8)?
            .filter(|c| !c.trim().is_empty()),
        address: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        temperature_f: row.get(10)?,
        blood_pressure: row.get(11)?,
        weight_kg: row.get(12)?,
        diabetic_mg_dl: row.get(13)?,
        fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn visit(date: NaiveDate, opd_no: &str, name: &str) -> VisitRecord {
        VisitRecord {
            id: None,
            date,
            opd_no: opd_no.into(),
            name: name.into(),
            guardian_name: "Richard Roe".into(),
            age_years: 34,
            age_months: None,
            gender: Gender::Male,
            cnic: Some("12345-1234567-1".into()),
            address: "123 Demo Street\nSpringfield".into(),
            temperature_f: 98.6,
            blood_pressure: "120/80".into(),
            weight_kg: Some(72.5),
            diabetic_mg_dl: None,
            fee: FeeType::Urgent,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        let original = visit(ymd(2025, 10, 25), "OPD-001", "John Doe");

        let id = db.insert_visit(&original).unwrap();
        let retrieved = db.get_visit(id).unwrap().unwrap();

        assert_eq!(retrieved.id, Some(id));
        assert_eq!(VisitRecord { id: None, ..retrieved }, original);
    }

    #[test]
    fn test_get_missing() {
        let db = setup_db();
        assert!(db.get_visit(42).unwrap().is_none());
    }

    #[test]
    fn test_list_orders_most_recent_first() {
        let db = setup_db();
        db.insert_visit(&visit(ymd(2025, 9, 1), "1", "A")).unwrap();
        db.insert_visit(&visit(ymd(2025, 10, 2), "2", "B")).unwrap();
        db.insert_visit(&visit(ymd(2025, 10, 2), "3", "C")).unwrap();

        let names: Vec<String> = db.list_visits().unwrap().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
        assert_eq!(db.count_visits().unwrap(), 3);
    }

    #[test]
    fn test_list_in_month() {
        let db = setup_db();
        db.insert_visit(&visit(ymd(2025, 11, 30), "1", "November")).unwrap();
        db.insert_visit(&visit(ymd(2025, 12, 1), "2", "December")).unwrap();
        db.insert_visit(&visit(ymd(2025, 12, 31), "3", "New Year's Eve")).unwrap();
        db.insert_visit(&visit(ymd(2026, 1, 1), "4", "January")).unwrap();

        let december = db.list_visits_in_month(2025, 12).unwrap();
        assert_eq!(december.len(), 2);
        assert!(december.iter().all(|v| v.date.month() == 12));

        assert_eq!(db.list_visits_in_month(2026, 1).unwrap().len(), 1);
        assert!(db.list_visits_in_month(2025, 13).is_err());
    }

    #[test]
    fn test_reads_legacy_rows() {
        let db = setup_db();
        db.conn()
            .execute(
                r#"
                INSERT INTO patients (date, opd_no, name, father_name, age, gender,
                                      cnic, address, temperature, bp, fees_type)
                VALUES ('2025-10-25T00:00:00', '', 'Old Row', NULL, 40, 'Female',
                        '', NULL, 99.1, '110/70', '')
                "#,
                [],
            )
            .unwrap();

        let rows = db.list_visits_in_month(2025, 10).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.date, ymd(2025, 10, 25));
        assert_eq!(row.opd_no, "");
        assert_eq!(row.guardian_name, "");
        assert_eq!(row.cnic, None);
        assert_eq!(row.fee, FeeType::Normal);
    }

    #[test]
    fn test_insert_inside_transaction_rolls_back() {
        let mut db = setup_db();
        {
            let tx = db.transaction().unwrap();
            insert_visit_on(&tx, &visit(ymd(2025, 10, 1), "1", "A")).unwrap();
            // dropped without commit
        }
        assert_eq!(db.count_visits().unwrap(), 0);
    }
}
