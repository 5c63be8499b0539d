//! Directions API key storage.
//!
//! A key saved by the user lives in a small JSON settings file and wins over
//! the `ORS_API_KEY` environment variable, which in turn wins over a key
//! baked in at build time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "ORS_API_KEY";

const BUILD_TIME_KEY: Option<&str> = option_env!("ORS_API_KEY");

#[derive(Debug, Default, Serialize, Deserialize)]
struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ors_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiKeyStore {
    override_path: PathBuf,
    fallback: Option<String>,
}

impl ApiKeyStore {
    /// Store whose fallback is the environment, then the build-time key.
    pub fn new(override_path: impl Into<PathBuf>) -> Self {
        let fallback = std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| BUILD_TIME_KEY.map(str::to_string));
        Self::with_fallback(override_path, fallback)
    }

    pub fn with_fallback(override_path: impl Into<PathBuf>, fallback: Option<String>) -> Self {
        Self {
            override_path: override_path.into(),
            fallback: fallback.and_then(non_blank),
        }
    }

    pub fn override_path(&self) -> &Path {
        &self.override_path
    }

    /// The key to use right now, if any. Blank keys count as absent.
    pub fn current(&self) -> Option<String> {
        match self.read_override() {
            Ok(Some(key)) => return Some(key),
            Ok(None) => {}
            Err(err) => warn!(path = %self.override_path.display(), error = %err, "ignoring unreadable settings file"),
        }
        self.fallback.clone()
    }

    pub fn read_override(&self) -> Result<Option<String>, ConfigError> {
        let json = match fs::read_to_string(&self.override_path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let settings: Settings = serde_json::from_str(&json)?;
        Ok(settings.ors_api_key.and_then(non_blank))
    }

    pub fn save_override(&self, key: &str) -> Result<(), ConfigError> {
        let key = non_blank(key.to_string()).ok_or(ConfigError::BlankKey)?;
        if let Some(parent) = self.override_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let settings = Settings { ors_api_key: Some(key) };
        let tmp_path = self.override_path.with_extension("tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(&settings)?)?;
        fs::rename(tmp_path, &self.override_path)?;
        Ok(())
    }

    pub fn clear_override(&self) -> Result<(), ConfigError> {
        match fs::remove_file(&self.override_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

pub(crate) fn non_blank(key: String) -> Option<String> {
    let trimmed = key.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
