use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::infra::sqlite::schema::open_connection;

pub fn load_session_payload(db_path: &Path, scope: &str) -> Result<Option<String>> {
    let conn = open_connection(db_path)?;
    conn.query_row(
        "SELECT payload FROM import_session WHERE scope = ?1",
        params![scope],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to load session for scope: {scope}"))
}

pub fn save_session_payload(db_path: &Path, scope: &str, payload: &str) -> Result<()> {
    let conn = open_connection(db_path)?;
    conn.execute(
        "INSERT INTO import_session(scope, payload, updated_at)
         VALUES (?1, ?2, CURRENT_TIMESTAMP)
         ON CONFLICT(scope) DO UPDATE SET
            payload = excluded.payload,
            updated_at = excluded.updated_at",
        params![scope, payload],
    )
    .with_context(|| format!("failed to save session for scope: {scope}"))?;
    Ok(())
}

pub fn clear_session_payload(db_path: &Path, scope: &str) -> Result<()> {
    let conn = open_connection(db_path)?;
    conn.execute("DELETE FROM import_session WHERE scope = ?1", params![scope])
        .with_context(|| format!("failed to clear session for scope: {scope}"))?;
    Ok(())
}

/// Drops sessions untouched for longer than `max_age_hours`. Returns how many
/// were removed.
pub fn purge_expired_sessions(db_path: &Path, max_age_hours: u32) -> Result<usize> {
    let conn = open_connection(db_path)?;
    let modifier = format!("-{max_age_hours} hours");
    conn.execute(
        "DELETE FROM import_session WHERE updated_at < datetime('now', ?1)",
        params![modifier],
    )
    .context("failed to purge expired sessions")
}

#[cfg(test)]
pub fn count_sessions(db_path: &Path) -> Result<i64> {
    let conn = open_connection(db_path)?;
    conn.query_row("SELECT COUNT(*) FROM import_session", [], |row| row.get(0))
        .context("failed to count sessions")
}
