use crate::domain::entities::contact::ContactFields;

pub const FIRST_NAME_REQUIRED: &str = "First name is required";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email format";

/// Outcome of running the contact rules over one candidate row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowVerdict {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl RowVerdict {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Single entry point for contact rules, shared by parsing and in-place editing.
///
/// Every applicable failure is reported. An empty email yields only the
/// "required" error; the format check runs only on a non-empty address.
/// Last name and telephone are never checked.
pub fn validate_contact(fields: &ContactFields) -> RowVerdict {
    let mut errors = Vec::new();

    if fields.first_name.trim().is_empty() {
        errors.push(FIRST_NAME_REQUIRED.to_string());
    }

    let email = fields.email.trim();
    if email.is_empty() {
        errors.push(EMAIL_REQUIRED.to_string());
    } else if !is_valid_email(email) {
        errors.push(EMAIL_INVALID.to_string());
    }

    RowVerdict::from_errors(errors)
}

/// `local@domain.tld` shape: exactly one `@`, no whitespace, and a dot in the
/// domain with at least one character on each side of it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(idx, ch)| ch == '.' && idx > 0 && idx + 1 < domain.len())
}
