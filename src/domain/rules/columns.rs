/// Logical columns of a contact import file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactColumn {
    FirstName,
    LastName,
    Email,
    Telephone,
}

/// Accepted header spellings per column, compared after trimming and lowercasing.
pub const HEADER_VARIANTS: &[(ContactColumn, &[&str])] = &[
    (
        ContactColumn::FirstName,
        &["firstname", "first_name", "first name"],
    ),
    (
        ContactColumn::LastName,
        &["lastname", "last_name", "last name"],
    ),
    (ContactColumn::Email, &["email"]),
    (
        ContactColumn::Telephone,
        &["telephone", "phone", "phone_number"],
    ),
];

impl ContactColumn {
    pub const ALL: [ContactColumn; 4] = [
        ContactColumn::FirstName,
        ContactColumn::LastName,
        ContactColumn::Email,
        ContactColumn::Telephone,
    ];

    pub fn accepted_headers(self) -> &'static [&'static str] {
        HEADER_VARIANTS
            .iter()
            .find(|(column, _)| *column == self)
            .map(|(_, variants)| *variants)
            .unwrap_or(&[])
    }

    pub fn matches_header(self, header: &str) -> bool {
        let normalized = normalize_header(header);
        self.accepted_headers()
            .iter()
            .any(|variant| *variant == normalized)
    }

    /// Columns the validator insists on.
    pub fn is_required(self) -> bool {
        matches!(self, ContactColumn::FirstName | ContactColumn::Email)
    }

    pub fn label(self) -> &'static str {
        match self {
            ContactColumn::FirstName => "First name",
            ContactColumn::LastName => "Last name",
            ContactColumn::Email => "Email",
            ContactColumn::Telephone => "Telephone",
        }
    }
}

pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Position of each logical column in a header row. `None` means the file has
/// no such column, which is legal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub email: Option<usize>,
    pub telephone: Option<usize>,
}

impl ColumnMap {
    /// First header matching a column wins.
    pub fn resolve(headers: &[String]) -> Self {
        let find = |column: ContactColumn| {
            headers
                .iter()
                .position(|header| column.matches_header(header))
        };

        Self {
            first_name: find(ContactColumn::FirstName),
            last_name: find(ContactColumn::LastName),
            email: find(ContactColumn::Email),
            telephone: find(ContactColumn::Telephone),
        }
    }

    pub fn index_of(&self, column: ContactColumn) -> Option<usize> {
        match column {
            ContactColumn::FirstName => self.first_name,
            ContactColumn::LastName => self.last_name,
            ContactColumn::Email => self.email,
            ContactColumn::Telephone => self.telephone,
        }
    }

    pub fn missing(&self) -> Vec<ContactColumn> {
        ContactColumn::ALL
            .into_iter()
            .filter(|column| self.index_of(*column).is_none())
            .collect()
    }

    /// Cell for `column` in `values`, or an empty string when the column is
    /// absent or the line is short.
    pub fn value(&self, values: &[String], column: ContactColumn) -> String {
        self.index_of(column)
            .and_then(|idx| values.get(idx))
            .cloned()
            .unwrap_or_default()
    }
}
