use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_SESSION_SCOPE: &str = "main";
pub const DEFAULT_SESSION_TTL_HOURS: u32 = 24;

pub const ENV_MAX_UPLOAD_BYTES: &str = "CONTACT_IMPORT_MAX_UPLOAD_BYTES";
pub const ENV_SESSION_DB: &str = "CONTACT_IMPORT_SESSION_DB";
pub const ENV_SESSION_SCOPE: &str = "CONTACT_IMPORT_SESSION_SCOPE";
pub const ENV_SESSION_TTL_HOURS: &str = "CONTACT_IMPORT_SESSION_TTL_HOURS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unable to resolve application directories")]
    NoProjectDirs,
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub session_db_path: PathBuf,
    pub webview_data_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub session_scope: String,
    pub session_ttl_hours: u32,
}

impl AppConfig {
    pub fn resolve() -> Result<Self, ConfigError> {
        let project_dirs = ProjectDirs::from("com", "hellhbbd", "contact-import")
            .ok_or(ConfigError::NoProjectDirs)?;
        Self::from_sources(
            project_dirs.cache_dir(),
            project_dirs.data_local_dir(),
            |key| std::env::var(key).ok(),
        )
    }

    /// Builds the config from base directories and an environment lookup.
    pub fn from_sources(
        cache_dir: &Path,
        data_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let max_upload_bytes = match env(ENV_MAX_UPLOAD_BYTES) {
            Some(value) => parse_positive(ENV_MAX_UPLOAD_BYTES, &value)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let session_ttl_hours = match env(ENV_SESSION_TTL_HOURS) {
            Some(value) => {
                let hours = parse_positive(ENV_SESSION_TTL_HOURS, &value)?;
                u32::try_from(hours).map_err(|_| ConfigError::InvalidNumber {
                    key: ENV_SESSION_TTL_HOURS,
                    value,
                })?
            }
            None => DEFAULT_SESSION_TTL_HOURS,
        };
        let session_scope = match env(ENV_SESSION_SCOPE) {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    key: ENV_SESSION_SCOPE,
                })
            }
            Some(value) => value.trim().to_string(),
            None => DEFAULT_SESSION_SCOPE.to_string(),
        };
        let session_db_path = env(ENV_SESSION_DB)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| cache_dir.join("session.sqlite"));

        Ok(Self {
            session_db_path,
            webview_data_dir: data_dir.join("webview2"),
            max_upload_bytes,
            session_scope,
            session_ttl_hours,
        })
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}
