use tracing::info;

use crate::domain::entities::contact::{ContactFields, ImportRow, RowId, RowPatch};
use crate::domain::entities::session::TransitionError;
use crate::domain::rules::validation::{validate_contact, RowVerdict};
use crate::usecase::ports::contact_sink::ContactSink;
use crate::usecase::services::session_service::{CommitError, SessionService};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowFilter {
    #[default]
    All,
    Valid,
    Invalid,
}

impl RowFilter {
    pub fn accepts(self, row: &ImportRow) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::Valid => row.is_valid(),
            RowFilter::Invalid => !row.is_valid(),
        }
    }
}

/// Edit form contents for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDraft {
    pub id: RowId,
    pub fields: ContactFields,
}

impl RowDraft {
    /// Live verdict for the form, computed by the same rules as the parser.
    pub fn verdict(&self) -> RowVerdict {
        validate_contact(&self.fields)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewCounts {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[derive(Default)]
pub struct PreviewController {
    filter: RowFilter,
    search: String,
    draft: Option<RowDraft>,
}

impl PreviewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> RowFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: RowFilter) {
        self.filter = filter;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn counts(&self, session: &SessionService) -> PreviewCounts {
        let session = session.session();
        PreviewCounts {
            total: session.rows().len(),
            valid: session.valid_count(),
            invalid: session.invalid_count(),
        }
    }

    /// Rows for the table, in file order, after the filter and search.
    pub fn visible_rows<'a>(&self, session: &'a SessionService) -> Vec<&'a ImportRow> {
        let needle = self.search.trim().to_lowercase();
        session
            .session()
            .rows()
            .iter()
            .filter(|row| self.filter.accepts(row))
            .filter(|row| needle.is_empty() || row.search_text().contains(&needle))
            .collect()
    }

    pub fn draft(&self) -> Option<&RowDraft> {
        self.draft.as_ref()
    }

    /// Opens the edit form pre-filled from the row.
    pub fn start_edit(&mut self, session: &SessionService, id: RowId) -> bool {
        self.draft = session.session().row(id).map(|row| RowDraft {
            id,
            fields: row.fields().clone(),
        });
        self.draft.is_some()
    }

    pub fn edit_draft(&mut self, edit: impl FnOnce(&mut ContactFields)) {
        if let Some(draft) = self.draft.as_mut() {
            edit(&mut draft.fields);
        }
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Writes the draft back through the session, which re-validates the row.
    pub fn save_edit(&mut self, session: &mut SessionService) -> Option<RowVerdict> {
        let draft = self.draft.take()?;
        session.update_row(draft.id, RowPatch::from(draft.fields))
    }

    pub fn delete(&mut self, session: &mut SessionService, id: RowId) -> bool {
        if self.draft.as_ref().is_some_and(|draft| draft.id == id) {
            self.draft = None;
        }
        session.delete_row(id)
    }

    pub fn can_commit(&self, session: &SessionService) -> bool {
        session.session().valid_count() > 0
    }

    pub fn commit(
        &mut self,
        session: &mut SessionService,
        sink: &dyn ContactSink,
    ) -> Result<usize, CommitError> {
        if !self.can_commit(session) {
            return Err(CommitError::Transition(TransitionError::NoValidRows));
        }
        let imported = session.commit(sink)?;
        self.reset_view();
        Ok(imported)
    }

    pub fn back(&mut self, session: &mut SessionService) -> Result<(), TransitionError> {
        session.back_to_upload()?;
        self.reset_view();
        info!("preview left for upload");
        Ok(())
    }

    pub fn reset_view(&mut self) {
        *self = Self::default();
    }
}
