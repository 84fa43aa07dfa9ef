use rusqlite::params;

use super::{Database, DbError};
use crate::progress::DailyRecord;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub fn upsert_setting(
    db: &Database,
    key: &str,
    value_json: &str,
    updated_at: &str,
) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO settings (key, value_json, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key)
         DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
        params![key, value_json, updated_at],
    )?;
    Ok(())
}

pub fn get_setting(db: &Database, key: &str) -> Result<Option<String>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare("SELECT value_json FROM settings WHERE key = ?1")?;
    let mut rows = stmt.query_map(params![key], |row| row.get(0))?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Daily focus history
// ---------------------------------------------------------------------------

pub fn upsert_daily_record(
    db: &Database,
    record: &DailyRecord,
    updated_at: &str,
) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO daily_focus (date, minutes, average_score, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(date)
         DO UPDATE SET minutes = excluded.minutes,
                       average_score = excluded.average_score,
                       updated_at = excluded.updated_at",
        params![record.date, record.minutes, record.average_score, updated_at],
    )?;
    Ok(())
}

/// All recorded days, oldest first.
pub fn list_daily_records(db: &Database) -> Result<Vec<DailyRecord>, DbError> {
    let conn = db.conn();
    let mut stmt =
        conn.prepare("SELECT date, minutes, average_score FROM daily_focus ORDER BY date")?;
    let rows = stmt.query_map([], |row| {
        Ok(DailyRecord {
            date: row.get(0)?,
            minutes: row.get(1)?,
            average_score: row.get(2)?,
        })
    })?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}
