use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::rules::columns::ContactColumn;
use crate::domain::rules::validation::{validate_contact, RowVerdict};

/// Opaque row key, assigned once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub Uuid);

impl RowId {
    pub fn generate() -> Self {
        RowId(Uuid::new_v4())
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telephone: String,
}

impl ContactFields {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        telephone: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            telephone: telephone.into(),
        }
    }

    pub fn get(&self, column: ContactColumn) -> &str {
        match column {
            ContactColumn::FirstName => &self.first_name,
            ContactColumn::LastName => &self.last_name,
            ContactColumn::Email => &self.email,
            ContactColumn::Telephone => &self.telephone,
        }
    }

    pub fn set(&mut self, column: ContactColumn, value: impl Into<String>) {
        let slot = match column {
            ContactColumn::FirstName => &mut self.first_name,
            ContactColumn::LastName => &mut self.last_name,
            ContactColumn::Email => &mut self.email,
            ContactColumn::Telephone => &mut self.telephone,
        };
        *slot = value.into();
    }

    fn merge(&mut self, patch: RowPatch) {
        if let Some(value) = patch.first_name {
            self.first_name = value.trim().to_string();
        }
        if let Some(value) = patch.last_name {
            self.last_name = value.trim().to_string();
        }
        if let Some(value) = patch.email {
            self.email = value.trim().to_string();
        }
        if let Some(value) = patch.telephone {
            self.telephone = value.trim().to_string();
        }
    }
}

/// Partial field update. Validity is never part of a patch; it is recomputed
/// by the row itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
}

impl RowPatch {
    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn telephone(mut self, value: impl Into<String>) -> Self {
        self.telephone = Some(value.into());
        self
    }
}

impl From<ContactFields> for RowPatch {
    fn from(fields: ContactFields) -> Self {
        Self {
            first_name: Some(fields.first_name),
            last_name: Some(fields.last_name),
            email: Some(fields.email),
            telephone: Some(fields.telephone),
        }
    }
}

/// One contact candidate read from an import file.
///
/// `is_valid` and `errors` are private and only ever written from the
/// validator's verdict, so `is_valid == errors.is_empty()` after any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub id: RowId,
    #[serde(flatten)]
    fields: ContactFields,
    is_valid: bool,
    #[serde(default)]
    errors: Vec<String>,
}

impl ImportRow {
    pub fn new(id: RowId, fields: ContactFields) -> Self {
        let mut row = Self {
            id,
            fields,
            is_valid: false,
            errors: Vec::new(),
        };
        row.revalidate();
        row
    }

    pub fn fields(&self) -> &ContactFields {
        &self.fields
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn apply_patch(&mut self, patch: RowPatch) -> RowVerdict {
        self.fields.merge(patch);
        self.revalidate()
    }

    pub fn revalidate(&mut self) -> RowVerdict {
        let verdict = validate_contact(&self.fields);
        self.is_valid = verdict.is_valid;
        self.errors = verdict.errors.clone();
        verdict
    }

    pub fn to_valid_contact(&self) -> Option<ValidContact> {
        self.is_valid.then(|| ValidContact {
            id: self.id,
            first_name: self.fields.first_name.clone(),
            last_name: self.fields.last_name.clone(),
            email: self.fields.email.clone(),
            telephone: self.fields.telephone.clone(),
        })
    }

    /// Lowercased text the table view searches on.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.fields.first_name, self.fields.last_name, self.fields.email, self.fields.telephone
        )
        .to_lowercase()
    }
}

/// What the downstream contact store receives on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidContact {
    pub id: RowId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telephone: String,
}
