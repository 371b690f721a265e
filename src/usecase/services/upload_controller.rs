use thiserror::Error;
use tracing::{info, warn};

use crate::domain::entities::session::TransitionError;
use crate::infra::import::csv::{parse_contacts_csv, ParseError, ParsedContacts};
use crate::usecase::services::session_service::SessionService;

const TEMPLATE_HINT: &str =
    "Download the template to see the expected columns: firstName, lastName, email, telephone";

/// Upload-level failures. Each one blocks the wizard and leaves the existing
/// session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Select a CSV file to upload")]
    NoFile,
    #[error("The file is empty")]
    EmptyFile,
    #[error("The file is {size} bytes; files up to {limit} bytes are accepted")]
    TooLarge { size: u64, limit: u64 },
    #[error("The file could not be read: {0}")]
    Unreadable(String),
    #[error("The file is not UTF-8 text")]
    NotUtf8,
    #[error("A file is already being processed")]
    InProgress,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("The file could not be loaded: {0}")]
    Refused(#[from] TransitionError),
}

impl UploadError {
    /// Human-readable reasons shown on the upload step.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            UploadError::Parse(err) => {
                let mut reasons = err.reasons();
                reasons.push(TEMPLATE_HINT.to_string());
                reasons
            }
            other => vec![other.to_string()],
        }
    }
}

/// A file picked by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Handle for one in-flight parse. A ticket that is no longer current when
/// its result arrives is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Advanced {
        rows: usize,
        valid: usize,
        invalid: usize,
    },
    Rejected(Vec<String>),
    Discarded,
}

/// Size and encoding checks followed by the parse. Pure; safe to run off the
/// UI thread.
pub fn read_upload(file: &SelectedFile, max_bytes: u64) -> Result<ParsedContacts, UploadError> {
    let size = file.bytes.len() as u64;
    if size == 0 {
        return Err(UploadError::EmptyFile);
    }
    if size > max_bytes {
        return Err(UploadError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let content = std::str::from_utf8(&file.bytes).map_err(|_| UploadError::NotUtf8)?;
    Ok(parse_contacts_csv(content)?)
}

pub struct UploadController {
    max_bytes: u64,
    next_ticket: u64,
    in_flight: Option<UploadTicket>,
    errors: Vec<String>,
}

impl UploadController {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            next_ticket: 0,
            in_flight: None,
            errors: Vec::new(),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Marks a parse as in progress. Rejected while another one is running.
    pub fn begin(&mut self) -> Result<UploadTicket, UploadError> {
        if self.in_flight.is_some() {
            return Err(UploadError::InProgress);
        }
        self.next_ticket += 1;
        let ticket = UploadTicket(self.next_ticket);
        self.in_flight = Some(ticket);
        self.errors.clear();
        Ok(ticket)
    }

    /// Forgets the in-flight parse; its result will be discarded on arrival.
    pub fn abandon(&mut self) {
        if self.in_flight.take().is_some() {
            info!("in-flight upload abandoned");
        }
    }

    /// Applies the result of the parse started with `ticket`.
    pub fn finish(
        &mut self,
        ticket: UploadTicket,
        file_name: &str,
        result: Result<ParsedContacts, UploadError>,
        session: &mut SessionService,
    ) -> UploadOutcome {
        if self.in_flight != Some(ticket) {
            info!(file_name, "stale upload result discarded");
            return UploadOutcome::Discarded;
        }
        self.in_flight = None;

        let parsed = match result {
            Ok(parsed) => parsed,
            Err(err) => return self.reject(file_name, err),
        };

        let rows = parsed.rows.len();
        let valid = parsed.valid_count();
        let invalid = parsed.invalid_count();
        match session.load_parsed(file_name, parsed.rows) {
            Ok(()) => UploadOutcome::Advanced {
                rows,
                valid,
                invalid,
            },
            Err(err) => {
                warn!(file_name, error = %err, "parsed rows refused by session");
                self.reject(file_name, UploadError::Refused(err))
            }
        }
    }

    /// Synchronous begin, parse and finish in one call.
    pub fn upload(
        &mut self,
        file: Option<&SelectedFile>,
        session: &mut SessionService,
    ) -> UploadOutcome {
        let Some(file) = file else {
            return self.reject("", UploadError::NoFile);
        };
        let ticket = match self.begin() {
            Ok(ticket) => ticket,
            Err(err) => return UploadOutcome::Rejected(err.reasons()),
        };
        let result = read_upload(file, self.max_bytes);
        self.finish(ticket, &file.name, result, session)
    }

    fn reject(&mut self, file_name: &str, err: UploadError) -> UploadOutcome {
        warn!(file_name, error = %err, "upload rejected");
        self.errors = err.reasons();
        UploadOutcome::Rejected(self.errors.clone())
    }
}
