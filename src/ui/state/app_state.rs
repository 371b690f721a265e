use std::sync::Arc;

use dioxus::prelude::{use_hook, use_signal, Signal};

use crate::config::AppConfig;
use crate::infra::memory::contact_sink::InMemoryContactSink;
use crate::open_session_store;
use crate::usecase::services::wizard::ImportWizard;

pub struct AppState {
    pub wizard: Signal<ImportWizard>,
    pub status: Signal<String>,
    pub contacts: Arc<InMemoryContactSink>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let contacts = use_hook(|| Arc::new(InMemoryContactSink::new()));
        let sink = contacts.clone();

        Self {
            wizard: use_signal(move || {
                let store = open_session_store(&config);
                ImportWizard::enter(
                    store,
                    &config.session_scope,
                    sink,
                    config.max_upload_bytes,
                )
            }),
            status: use_signal(|| "Ready".to_string()),
            contacts,
        }
    }
}
