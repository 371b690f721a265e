use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open session db: {}", db_path.display()))?;
    conn.busy_timeout(std::time::Duration::from_secs(2))
        .context("failed to set busy timeout")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS import_session (
            scope       TEXT PRIMARY KEY,
            payload     TEXT NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        ",
    )
    .context("failed to initialize session schema")?;

    Ok(())
}
