use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::contact::{ImportRow, RowId, RowPatch, ValidContact};
use crate::domain::rules::validation::RowVerdict;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    #[default]
    Upload,
    Preview,
    Complete,
}

impl WizardStep {
    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Upload => "Upload",
            WizardStep::Preview => "Preview",
            WizardStep::Complete => "Complete",
        }
    }

    pub fn position(self) -> usize {
        match self {
            WizardStep::Upload => 1,
            WizardStep::Preview => 2,
            WizardStep::Complete => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("the file produced no rows")]
    NoRows,
    #[error("there are no valid rows to import")]
    NoValidRows,
    #[error("cannot {action} from the {from:?} step")]
    WrongStep {
        action: &'static str,
        from: WizardStep,
    },
    #[error("duplicate row id {0}")]
    DuplicateRowId(RowId),
}

/// Wizard state shared by the Upload, Preview and Complete steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportSession {
    step: WizardStep,
    rows: Vec<ImportRow>,
    file_name: Option<String>,
    imported_count: usize,
    skipped_count: usize,
    committed_at: Option<DateTime<Utc>>,
}

impl ImportSession {
    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn rows(&self) -> &[ImportRow] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&ImportRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn imported_count(&self) -> usize {
        self.imported_count
    }

    /// Invalid rows left behind by the last commit.
    pub fn skipped_count(&self) -> usize {
        self.skipped_count
    }

    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at
    }

    pub fn valid_rows(&self) -> impl Iterator<Item = &ImportRow> {
        self.rows.iter().filter(|row| row.is_valid())
    }

    pub fn invalid_rows(&self) -> impl Iterator<Item = &ImportRow> {
        self.rows.iter().filter(|row| !row.is_valid())
    }

    pub fn valid_count(&self) -> usize {
        self.valid_rows().count()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_rows().count()
    }

    pub fn is_empty(&self) -> bool {
        *self == ImportSession::default()
    }

    /// Replaces rows and file name wholesale and moves to Preview.
    pub fn load_parsed(
        &mut self,
        file_name: impl Into<String>,
        rows: Vec<ImportRow>,
    ) -> Result<(), TransitionError> {
        if rows.is_empty() {
            return Err(TransitionError::NoRows);
        }
        if let Some(id) = first_duplicate_id(&rows) {
            return Err(TransitionError::DuplicateRowId(id));
        }

        self.rows = rows;
        self.file_name = Some(file_name.into());
        self.imported_count = 0;
        self.skipped_count = 0;
        self.committed_at = None;
        self.step = WizardStep::Preview;
        Ok(())
    }

    /// Merges `patch` into the row and re-runs validation on it. Returns
    /// `None` when no row has that id.
    pub fn update_row(&mut self, id: RowId, patch: RowPatch) -> Option<RowVerdict> {
        self.rows
            .iter_mut()
            .find(|row| row.id == id)
            .map(|row| row.apply_patch(patch))
    }

    /// Removes the row; order of the remaining rows is untouched.
    pub fn delete_row(&mut self, id: RowId) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        self.rows.len() != before
    }

    /// Back from Preview to Upload. Rows stay until a new parse replaces them.
    pub fn back_to_upload(&mut self) -> Result<(), TransitionError> {
        match self.step {
            WizardStep::Preview | WizardStep::Upload => {
                self.step = WizardStep::Upload;
                Ok(())
            }
            from => Err(TransitionError::WrongStep {
                action: "go back",
                from,
            }),
        }
    }

    /// Snapshots the valid row count and moves to Complete. The returned
    /// contacts are exactly the rows valid at this moment.
    pub fn commit(&mut self, at: DateTime<Utc>) -> Result<Vec<ValidContact>, TransitionError> {
        if self.step != WizardStep::Preview {
            return Err(TransitionError::WrongStep {
                action: "commit",
                from: self.step,
            });
        }
        let contacts = self.valid_contacts();
        if contacts.is_empty() {
            return Err(TransitionError::NoValidRows);
        }

        self.imported_count = contacts.len();
        self.skipped_count = self.invalid_count();
        self.committed_at = Some(at);
        self.step = WizardStep::Complete;
        Ok(contacts)
    }

    pub fn valid_contacts(&self) -> Vec<ValidContact> {
        self.rows
            .iter()
            .filter_map(ImportRow::to_valid_contact)
            .collect()
    }

    pub fn reset(&mut self) {
        *self = ImportSession::default();
    }

    /// Repairs state that cannot be rendered consistently: rows are
    /// re-validated and a step whose preconditions do not hold falls back to
    /// Upload.
    pub fn normalized(mut self) -> Self {
        for row in &mut self.rows {
            row.revalidate();
        }

        let inconsistent = match self.step {
            WizardStep::Upload => false,
            WizardStep::Preview => self.rows.is_empty(),
            WizardStep::Complete => self.imported_count == 0,
        };
        if inconsistent {
            self.step = WizardStep::Upload;
        }
        self
    }

    pub fn has_unique_ids(&self) -> bool {
        first_duplicate_id(&self.rows).is_none()
    }
}

fn first_duplicate_id(rows: &[ImportRow]) -> Option<RowId> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter().map(|row| row.id).find(|id| !seen.insert(*id))
}
