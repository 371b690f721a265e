pub mod app;
pub mod config;

pub mod domain {
    pub mod entities {
        pub mod contact;
        pub mod session;
    }
    pub mod rules {
        pub mod columns;
        pub mod validation;
    }
}

pub mod infra {
    pub mod import {
        pub mod csv;
        pub mod export;
        pub mod tokenizer;
    }
    pub mod memory {
        pub mod contact_sink;
        pub mod session_store;
    }
    pub mod sqlite {
        pub mod queries;
        pub mod repo;
        pub mod schema;
    }
}

pub mod platform {
    pub mod desktop {
        pub mod blocking;
    }
}

pub mod ui {
    pub mod state {
        pub mod app_state;
    }
}

pub mod usecase {
    pub mod ports {
        pub mod contact_sink;
        pub mod session_store;
    }
    pub mod services {
        pub mod complete_controller;
        pub mod preview_controller;
        pub mod session_service;
        pub mod upload_controller;
        pub mod wizard;
    }
}

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::infra::memory::session_store::MemorySessionStore;
use crate::infra::sqlite::repo::SqliteSessionStore;
use crate::usecase::ports::session_store::SessionStore;

/// SQLite-backed store when it can be opened, otherwise an in-memory one so
/// the wizard still works without surviving a restart.
pub fn open_session_store(config: &AppConfig) -> Arc<dyn SessionStore> {
    match SqliteSessionStore::open(config.session_db_path.clone(), config.session_ttl_hours) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            warn!(
                error = %err,
                path = %config.session_db_path.display(),
                "session store unavailable, progress will not survive a restart"
            );
            Arc::new(MemorySessionStore::new())
        }
    }
}

/// `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
