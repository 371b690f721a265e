use std::sync::Mutex;

use tracing::info;

use crate::domain::entities::contact::ValidContact;
use crate::usecase::ports::contact_sink::{ContactSink, SinkError};

/// Keeps committed contacts in memory for the display layer.
#[derive(Default)]
pub struct InMemoryContactSink {
    contacts: Mutex<Vec<ValidContact>>,
}

impl InMemoryContactSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contacts(&self) -> Vec<ValidContact> {
        self.contacts
            .lock()
            .map(|contacts| contacts.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.contacts
            .lock()
            .map(|contacts| contacts.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContactSink for InMemoryContactSink {
    fn accept(&self, contacts: Vec<ValidContact>) -> Result<(), SinkError> {
        let mut stored = self
            .contacts
            .lock()
            .map_err(|_| SinkError::Rejected("contact list lock poisoned".to_string()))?;
        info!(count = contacts.len(), "contacts handed to the contact list");
        stored.extend(contacts);
        Ok(())
    }
}
