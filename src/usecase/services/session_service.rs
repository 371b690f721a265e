use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::entities::contact::{ImportRow, RowId, RowPatch};
use crate::domain::entities::session::{ImportSession, TransitionError, WizardStep};
use crate::domain::rules::validation::RowVerdict;
use crate::usecase::ports::contact_sink::{ContactSink, SinkError};
use crate::usecase::ports::session_store::SessionStore;

const PAYLOAD_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoredSession<S> {
    version: u32,
    session: S,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Owns the wizard session and writes it through to the session store after
/// every mutation.
///
/// Store failures never surface to callers: they are logged and the session
/// keeps working in memory.
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    scope: String,
    session: ImportSession,
}

impl SessionService {
    /// Rehydrates the session for `scope`. Missing, unreadable or corrupt data
    /// yields the empty initial session.
    pub fn open(store: Arc<dyn SessionStore>, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        let session = rehydrate(store.as_ref(), &scope);
        info!(
            scope = %scope,
            step = session.step().label(),
            rows = session.rows().len(),
            "import session opened"
        );
        Self {
            store,
            scope,
            session,
        }
    }

    pub fn session(&self) -> &ImportSession {
        &self.session
    }

    pub fn step(&self) -> WizardStep {
        self.session.step()
    }

    pub fn load_parsed(
        &mut self,
        file_name: impl Into<String>,
        rows: Vec<ImportRow>,
    ) -> Result<(), TransitionError> {
        let file_name = file_name.into();
        let row_count = rows.len();
        self.mutate(|session| session.load_parsed(file_name, rows))?;
        info!(
            rows = row_count,
            valid = self.session.valid_count(),
            invalid = self.session.invalid_count(),
            "parsed file loaded into preview"
        );
        Ok(())
    }

    /// Patches the row and re-validates it. `None` when the id is unknown, in
    /// which case nothing is written.
    pub fn update_row(&mut self, id: RowId, patch: RowPatch) -> Option<RowVerdict> {
        if self.session.row(id).is_none() {
            debug!(%id, "update for unknown row ignored");
            return None;
        }
        let verdict = self
            .mutate(|session| Ok(session.update_row(id, patch)))
            .ok()
            .flatten();
        debug!(%id, valid = verdict.as_ref().map(|v| v.is_valid), "row updated");
        verdict
    }

    pub fn delete_row(&mut self, id: RowId) -> bool {
        if self.session.row(id).is_none() {
            return false;
        }
        let removed = self
            .mutate(|session| Ok(session.delete_row(id)))
            .unwrap_or(false);
        debug!(%id, remaining = self.session.rows().len(), "row deleted");
        removed
    }

    pub fn back_to_upload(&mut self) -> Result<(), TransitionError> {
        self.mutate(ImportSession::back_to_upload)?;
        info!("returned to upload step");
        Ok(())
    }

    /// Hands the currently valid rows to `sink`, then snapshots their count
    /// and moves to Complete. Nothing changes if the sink rejects them.
    pub fn commit(&mut self, sink: &dyn ContactSink) -> Result<usize, CommitError> {
        let mut next = self.session.clone();
        let contacts = next.commit(Utc::now())?;
        let count = contacts.len();
        sink.accept(contacts)?;

        self.session = next;
        self.persist();
        info!(
            imported = count,
            skipped = self.session.skipped_count(),
            "import committed"
        );
        Ok(count)
    }

    /// Clears every stored field. The cleared session is still written so a
    /// reopen starts empty.
    pub fn reset(&mut self) {
        self.session.reset();
        self.persist();
        info!("import session reset");
    }

    /// Resets and removes the stored entry entirely.
    pub fn discard(&mut self) {
        self.session.reset();
        if let Err(err) = self.store.clear(&self.scope) {
            warn!(error = %err, "failed to clear stored import session");
        }
        info!("import session discarded");
    }

    /// Re-applies the consistency rules to the live session, e.g. before a
    /// step is rendered.
    pub fn enforce_invariants(&mut self) -> WizardStep {
        let normalized = self.session.clone().normalized();
        if normalized != self.session {
            warn!(
                from = self.session.step().label(),
                to = normalized.step().label(),
                "inconsistent import session repaired"
            );
            self.session = normalized;
            self.persist();
        }
        self.session.step()
    }

    /// Applies `f` to a copy and swaps it in only on success, so every
    /// mutation replaces the whole session at once.
    fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut ImportSession) -> Result<T, TransitionError>,
    ) -> Result<T, TransitionError> {
        let mut next = self.session.clone();
        let out = f(&mut next)?;
        self.session = next;
        self.persist();
        Ok(out)
    }

    fn persist(&self) {
        let payload = match encode_session(&self.session) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialize import session");
                return;
            }
        };
        if let Err(err) = self.store.save(&self.scope, &payload) {
            warn!(error = %err, "failed to persist import session");
        }
    }
}

fn rehydrate(store: &dyn SessionStore, scope: &str) -> ImportSession {
    let payload = match store.load(scope) {
        Ok(Some(payload)) => payload,
        Ok(None) => return ImportSession::default(),
        Err(err) => {
            warn!(error = %err, "session store unavailable, starting empty");
            return ImportSession::default();
        }
    };

    decode_session(&payload).unwrap_or_else(|| {
        warn!(scope, "stored import session is unreadable, starting empty");
        ImportSession::default()
    })
}

/// Serialized form written to the store.
pub fn encode_session(session: &ImportSession) -> serde_json::Result<String> {
    serde_json::to_string(&StoredSession {
        version: PAYLOAD_VERSION,
        session,
    })
}

/// Inverse of [`encode_session`]. `None` for malformed payloads, other
/// versions, or sessions with duplicate row ids.
pub fn decode_session(payload: &str) -> Option<ImportSession> {
    let stored: StoredSession<ImportSession> = serde_json::from_str(payload).ok()?;
    if stored.version != PAYLOAD_VERSION || !stored.session.has_unique_ids() {
        return None;
    }
    Some(stored.session.normalized())
}
