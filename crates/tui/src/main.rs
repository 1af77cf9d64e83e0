mod app;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use heroes_core::{
    config::{self, AppConfig},
    remote::HeroesApi,
    token::TokenStore,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    info!(
        path = %config_path.display(),
        records_url = %config.records_url,
        "Configuration loaded"
    );

    let api = HeroesApi::new(config.records_url.clone(), config.auth_url.clone())
        .with_upload_url(config.upload_url.clone());
    let tokens = TokenStore::new(config.token_path());

    let mut app = app::HeroesApp::new(api, tokens, config.period_presets());
    app.run().await
}

/// File-only logging; the terminal belongs to the UI while it runs.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("heroes.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
