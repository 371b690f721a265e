use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Message(String),
}

/// Volatile, scope-keyed storage for the serialized wizard session.
///
/// A scope plays the role of a browser tab: sessions in different scopes
/// never see each other.
pub trait SessionStore: Send + Sync {
    fn load(&self, scope: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, scope: &str, payload: &str) -> Result<(), StoreError>;
    fn clear(&self, scope: &str) -> Result<(), StoreError>;
}
