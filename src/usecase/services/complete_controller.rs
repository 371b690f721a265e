use chrono::{DateTime, Utc};

use crate::domain::entities::session::WizardStep;
use crate::usecase::services::session_service::SessionService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSummary {
    pub imported: usize,
    pub skipped: usize,
    pub file_name: Option<String>,
    pub committed_at: Option<DateTime<Utc>>,
}

/// Read-only view of a finished import plus the two exits from the flow.
pub struct CompleteController;

impl CompleteController {
    /// `None` when the session is not in a consistent Complete state; the
    /// caller should send the operator back to Upload.
    pub fn summary(session: &SessionService) -> Option<CompletionSummary> {
        let state = session.session();
        if state.step() != WizardStep::Complete || state.imported_count() == 0 {
            return None;
        }
        Some(CompletionSummary {
            imported: state.imported_count(),
            skipped: state.skipped_count(),
            file_name: state.file_name().map(str::to_string),
            committed_at: state.committed_at(),
        })
    }

    /// Starts over at Upload with an empty session.
    pub fn import_more(session: &mut SessionService) {
        session.reset();
    }

    /// Empties the session and removes it from the store before leaving.
    pub fn finish(session: &mut SessionService) {
        session.discard();
    }
}
