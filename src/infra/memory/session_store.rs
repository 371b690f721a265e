use std::collections::HashMap;
use std::sync::Mutex;

use crate::usecase::ports::session_store::{SessionStore, StoreError};

/// Process-lifetime session store. Used when the SQLite store cannot be
/// opened, and in tests.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> Result<T, StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(f(&mut entries))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, scope: &str) -> Result<Option<String>, StoreError> {
        self.with_entries(|entries| entries.get(scope).cloned())
    }

    fn save(&self, scope: &str, payload: &str) -> Result<(), StoreError> {
        self.with_entries(|entries| {
            entries.insert(scope.to_string(), payload.to_string());
        })
    }

    fn clear(&self, scope: &str) -> Result<(), StoreError> {
        self.with_entries(|entries| {
            entries.remove(scope);
        })
    }
}
