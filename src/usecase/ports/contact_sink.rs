use thiserror::Error;

use crate::domain::entities::contact::ValidContact;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("contact store rejected the import: {0}")]
    Rejected(String),
}

/// Downstream collaborator that turns committed rows into contact records.
pub trait ContactSink: Send + Sync {
    fn accept(&self, contacts: Vec<ValidContact>) -> Result<(), SinkError>;
}
