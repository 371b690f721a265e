use std::path::PathBuf;

use tracing::{debug, info};

use crate::infra::sqlite::queries::{
    clear_session_payload, load_session_payload, purge_expired_sessions, save_session_payload,
};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::session_store::{SessionStore, StoreError};

/// Session store backed by a SQLite file in the cache directory.
pub struct SqliteSessionStore {
    pub db_path: PathBuf,
}

impl SqliteSessionStore {
    /// Creates the schema and drops sessions older than `ttl_hours`.
    pub fn open(db_path: PathBuf, ttl_hours: u32) -> Result<Self, StoreError> {
        init_db(&db_path).map_err(|err| StoreError::Unavailable(format!("{err:#}")))?;
        let purged = purge_expired_sessions(&db_path, ttl_hours)
            .map_err(|err| StoreError::Message(format!("{err:#}")))?;
        if purged > 0 {
            info!(purged, "dropped expired import sessions");
        }
        Ok(Self { db_path })
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, scope: &str) -> Result<Option<String>, StoreError> {
        load_session_payload(&self.db_path, scope)
            .map_err(|err| StoreError::Message(format!("{err:#}")))
    }

    fn save(&self, scope: &str, payload: &str) -> Result<(), StoreError> {
        debug!(scope, bytes = payload.len(), "saving import session");
        save_session_payload(&self.db_path, scope, payload)
            .map_err(|err| StoreError::Message(format!("{err:#}")))
    }

    fn clear(&self, scope: &str) -> Result<(), StoreError> {
        clear_session_payload(&self.db_path, scope)
            .map_err(|err| StoreError::Message(format!("{err:#}")))
    }
}
