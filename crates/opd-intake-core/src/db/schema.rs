//! SQLite schema definition.

use rusqlite::Connection;

use super::DbResult;

/// Visit table. Column names stay compatible with databases created by
/// earlier releases of the intake tool.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,                          -- YYYY-MM-DD
    opd_no TEXT NOT NULL,
    name TEXT NOT NULL,
    father_name TEXT,
    age INTEGER NOT NULL,
    age_months INTEGER,
    gender TEXT NOT NULL,
    cnic TEXT,
    address TEXT,
    temperature REAL NOT NULL,
    bp TEXT NOT NULL,
    weight REAL,
    diabetic REAL,
    fees_type TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_date ON patients(date);
"#;

/// Columns added after the first release, with the definition used to add
/// them to an older file.
pub const ADDED_COLUMNS: &[(&str, &str)] = &[
    ("opd_no", "opd_no TEXT DEFAULT ''"),
    ("father_name", "father_name TEXT DEFAULT ''"),
    ("age_months", "age_months INTEGER"),
    ("cnic", "cnic TEXT"),
    ("address", "address TEXT"),
    ("weight", "weight REAL"),
    ("diabetic", "diabetic REAL"),
    ("fees_type", "fees_type TEXT DEFAULT 'Normal'"),
];

/// Add any missing columns to an existing `patients` table.
pub fn migrate_columns(conn: &Connection) -> DbResult<Vec<&'static str>> {
    let existing: Vec<String> = conn
        .prepare("PRAGMA table_info(patients)")?
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;

    let mut added = Vec::new();
    for (column, definition) in ADDED_COLUMNS {
        if !existing.iter().any(|c| c == column) {
            conn.execute(&format!("ALTER TABLE patients ADD COLUMN {definition}"), [])?;
            added.push(*column);
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrates_legacy_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE patients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                name TEXT NOT NULL,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                temperature REAL NOT NULL,
                bp TEXT NOT NULL
            );
            "#,
        )
        .unwrap();

        let added = migrate_columns(&conn).unwrap();
        assert_eq!(added.len(), ADDED_COLUMNS.len());

        // Second pass is a no-op
        assert!(migrate_columns(&conn).unwrap().is_empty());
    }
}
