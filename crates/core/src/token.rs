#![allow(missing_docs)]

//! Session token persisted between runs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name used under the data directory.
pub const TOKEN_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    admin_token: String,
    saved_at: DateTime<Utc>,
}

/// Durable holder of the admin session token, keyed as `admin_token`.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the user's data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("heroes")
            .join(TOKEN_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored token, or `None` when nothing was saved.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read token {}", self.path.display()))?;
        let stored: StoredToken = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse token {}", self.path.display()))?;
        Ok(Some(stored.admin_token).filter(|token| !token.is_empty()))
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create token directory {}", parent.display())
            })?;
        }
        let stored = StoredToken {
            admin_token: token.to_string(),
            saved_at: Utc::now(),
        };
        let serialized =
            serde_json::to_string_pretty(&stored).context("failed to serialize token")?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write token {}", self.path.display()))
    }

    /// Forget the token. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("failed to remove token {}", self.path.display()))
    }
}
