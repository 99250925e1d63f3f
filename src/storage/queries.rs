use rusqlite::{Connection, OptionalExtension, params};

use super::StorageError;
use super::types::Preference;

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn get_preference(conn: &Connection, key: &str) -> Result<Option<Preference>, StorageError> {
    let mut stmt =
        conn.prepare("SELECT key, value, updated_at FROM preferences WHERE key = ?1")?;
    let preference = stmt
        .query_row(params![key], |row| {
            Ok(Preference {
                key: row.get(0)?,
                value: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })
        .optional()?;
    Ok(preference)
}

pub fn set_preference(
    conn: &Connection,
    key: &str,
    value: &str,
) -> Result<Preference, StorageError> {
    let mut stmt = conn.prepare(
        "INSERT INTO preferences (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
         RETURNING key, value, updated_at",
    )?;
    let saved = stmt.query_row(params![key, value, now_unix()], |row| {
        Ok(Preference {
            key: row.get(0)?,
            value: row.get(1)?,
            updated_at: row.get(2)?,
        })
    })?;
    Ok(saved)
}

/// Returns true if a row was removed.
pub fn delete_preference(conn: &Connection, key: &str) -> Result<bool, StorageError> {
    let removed = conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
    Ok(removed > 0)
}
