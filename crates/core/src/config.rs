//! Application configuration: defaults, a JSON file, then `HEROES_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    catalogue::{default_period_presets, PeriodPreset, ALL},
    token::TokenStore,
};

/// Directory under the user's config dir.
pub const CONFIG_DIR: &str = "heroes";
/// Configuration file name.
pub const CONFIG_FILE: &str = "config.json";
/// Prefix for environment overrides, e.g. `HEROES_RECORDS_URL`.
pub const ENV_PREFIX: &str = "HEROES";

/// Runtime settings for the catalogue client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Records endpoint (list, create, update, delete).
    pub records_url: String,
    /// Password exchange endpoint.
    pub auth_url: String,
    /// Image upload endpoint (base64 JSON body, answers with a public URL).
    pub upload_url: String,
    /// Where the session token lives; defaults to the user data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,
    /// Period tab bar.
    pub periods: Vec<PeriodPreset>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            records_url: "http://127.0.0.1:8000/heroes".to_string(),
            auth_url: "http://127.0.0.1:8000/auth".to_string(),
            upload_url: "http://127.0.0.1:8000/upload-image".to_string(),
            token_path: None,
            periods: default_period_presets(),
        }
    }
}

impl AppConfig {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from `path` (optional) with environment overrides on top.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Json).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        Ok(config)
    }

    /// Token file location, falling back to the data directory.
    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(TokenStore::default_path)
    }

    /// Configured presets with the `all` tab guaranteed in front.
    pub fn period_presets(&self) -> Vec<PeriodPreset> {
        if self.periods.is_empty() {
            return default_period_presets();
        }
        let mut presets: Vec<PeriodPreset> = self
            .periods
            .iter()
            .filter(|preset| preset.value != ALL)
            .cloned()
            .collect();
        let all = self
            .periods
            .iter()
            .find(|preset| preset.value == ALL)
            .cloned()
            .unwrap_or_else(|| PeriodPreset::new(ALL, "Все периоды"));
        presets.insert(0, all);
        presets
    }
}

/// Default configuration file path.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write a default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default configuration")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write configuration {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join(CONFIG_FILE))?;
        assert_eq!(config.periods, default_period_presets());
        assert!(config.upload_url.ends_with("/upload-image"));
        assert_eq!(config.token_path, None);
        Ok(())
    }

    #[test]
    fn file_overrides_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{
                "records_url": "https://example.com/heroes",
                "periods": [{"value": "Чечня", "label": "Чечня"}]
            }"#,
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.records_url, "https://example.com/heroes");

        let presets = config.period_presets();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].value, ALL);
        assert_eq!(presets[1].value, "Чечня");
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        std::env::set_var("HEROES_AUTH_URL", "https://auth.example.com");
        let config = AppConfig::load_from(&dir.path().join(CONFIG_FILE));
        std::env::remove_var("HEROES_AUTH_URL");
        assert_eq!(config?.auth_url, "https://auth.example.com");
        Ok(())
    }

    #[test]
    fn default_config_is_written_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("heroes").join(CONFIG_FILE);
        write_default_config(&path)?;
        let written = AppConfig::load_from(&path)?;
        assert_eq!(written.periods, AppConfig::default().periods);

        fs::write(&path, r#"{"records_url": "https://kept.example.com"}"#)?;
        write_default_config(&path)?;
        assert!(fs::read_to_string(&path)?.contains("kept.example.com"));
        Ok(())
    }
}
