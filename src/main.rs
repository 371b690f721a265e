use anyhow::{Context, Result};
use tracing::info;

use contact_import::app::App;
use contact_import::config::AppConfig;

fn main() -> Result<()> {
    contact_import::init_tracing();

    let config = AppConfig::resolve().context("failed to resolve configuration")?;
    std::fs::create_dir_all(&config.webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            config.webview_data_dir.display()
        )
    })?;
    info!(
        session_db = %config.session_db_path.display(),
        scope = %config.session_scope,
        "starting contact import"
    );

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("Import contacts"))
                .with_data_directory(config.webview_data_dir),
        )
        .launch(App);

    Ok(())
}
