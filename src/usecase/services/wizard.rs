use std::sync::Arc;

use tracing::info;

use crate::domain::entities::contact::{ContactFields, RowId};
use crate::domain::entities::session::{TransitionError, WizardStep};
use crate::domain::rules::validation::RowVerdict;
use crate::infra::import::csv::ParsedContacts;
use crate::usecase::ports::contact_sink::ContactSink;
use crate::usecase::ports::session_store::SessionStore;
use crate::usecase::services::complete_controller::{CompleteController, CompletionSummary};
use crate::usecase::services::preview_controller::PreviewController;
use crate::usecase::services::session_service::{CommitError, SessionService};
use crate::usecase::services::upload_controller::{
    SelectedFile, UploadController, UploadError, UploadOutcome, UploadTicket,
};

/// Top-level owner of one import flow. The session lives here and is lent to
/// each step controller; nothing about it is global.
pub struct ImportWizard {
    session: SessionService,
    upload: UploadController,
    preview: PreviewController,
    sink: Arc<dyn ContactSink>,
}

impl ImportWizard {
    /// Enters the flow, rehydrating whatever the store holds for `scope`.
    pub fn enter(
        store: Arc<dyn SessionStore>,
        scope: &str,
        sink: Arc<dyn ContactSink>,
        max_upload_bytes: u64,
    ) -> Self {
        let mut session = SessionService::open(store, scope);
        session.enforce_invariants();
        Self {
            session,
            upload: UploadController::new(max_upload_bytes),
            preview: PreviewController::new(),
            sink,
        }
    }

    /// Leaves the flow. Any parse still running is abandoned; the stored
    /// session stays so coming back resumes where the operator was.
    pub fn exit(mut self) {
        self.upload.abandon();
        info!(step = self.session.step().label(), "import flow left");
    }

    pub fn step(&self) -> WizardStep {
        self.session.step()
    }

    /// Current step after repairing any inconsistent state.
    pub fn checked_step(&mut self) -> WizardStep {
        self.session.enforce_invariants()
    }

    pub fn session(&self) -> &SessionService {
        &self.session
    }

    pub fn upload(&self) -> &UploadController {
        &self.upload
    }

    pub fn preview(&self) -> &PreviewController {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut PreviewController {
        &mut self.preview
    }

    pub fn begin_upload(&mut self) -> Result<UploadTicket, UploadError> {
        self.upload.begin()
    }

    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        file_name: &str,
        result: Result<ParsedContacts, UploadError>,
    ) -> UploadOutcome {
        let outcome = self
            .upload
            .finish(ticket, file_name, result, &mut self.session);
        if matches!(outcome, UploadOutcome::Advanced { .. }) {
            self.preview.reset_view();
        }
        outcome
    }

    pub fn upload_now(&mut self, file: Option<&SelectedFile>) -> UploadOutcome {
        let outcome = self.upload.upload(file, &mut self.session);
        if matches!(outcome, UploadOutcome::Advanced { .. }) {
            self.preview.reset_view();
        }
        outcome
    }

    pub fn start_edit(&mut self, id: RowId) -> bool {
        self.preview.start_edit(&self.session, id)
    }

    pub fn edit_draft(&mut self, edit: impl FnOnce(&mut ContactFields)) {
        self.preview.edit_draft(edit);
    }

    pub fn save_edit(&mut self) -> Option<RowVerdict> {
        let verdict = self.preview.save_edit(&mut self.session);
        self.settle();
        verdict
    }

    /// Deleting the last row leaves nothing to preview, so the flow drops
    /// back to Upload.
    pub fn delete_row(&mut self, id: RowId) -> bool {
        let removed = self.preview.delete(&mut self.session, id);
        if removed {
            self.settle();
        }
        removed
    }

    pub fn back(&mut self) -> Result<(), TransitionError> {
        self.preview.back(&mut self.session)
    }

    pub fn commit(&mut self) -> Result<usize, CommitError> {
        self.preview.commit(&mut self.session, self.sink.as_ref())
    }

    pub fn completion(&self) -> Option<CompletionSummary> {
        CompleteController::summary(&self.session)
    }

    pub fn import_more(&mut self) {
        self.upload.abandon();
        self.preview.reset_view();
        CompleteController::import_more(&mut self.session);
    }

    fn settle(&mut self) {
        if self.checked_step() == WizardStep::Upload {
            self.preview.reset_view();
        }
    }

    pub fn finish(&mut self) {
        self.upload.abandon();
        self.preview.reset_view();
        CompleteController::finish(&mut self.session);
        info!("import flow finished");
    }
}
