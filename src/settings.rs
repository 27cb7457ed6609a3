//! Persisted user settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Default chat backend base URL
pub const DEFAULT_BACKEND_URL: &str = "https://claude.ai";

/// User settings, persisted as JSON. Read on demand; last write wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Conversation ("project") preselected in listings
    pub default_project: Option<String>,
    /// Use the inferred question without prompting interactively
    pub auto_detect: bool,
    /// Base URL of the chat backend
    pub backend_url: String,
    /// Optional readability-service endpoint; unset disables strategy (b)
    pub readability_url: Option<String>,
    /// Ambient session cookie value for the backend
    pub session_cookie: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_project: None,
            auto_detect: true,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            readability_url: None,
            session_cookie: None,
        }
    }
}

/// Loads and stores settings under `~/.fieldpilot/settings.json`
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Unable to determine home directory")?;
        let dir = home_dir.join(".fieldpilot");
        fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join("settings.json"),
        })
    }

    /// Store rooted at an explicit path (used by tests)
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load settings, falling back to defaults when the file is missing
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!("No settings file at {}, using defaults", self.path.display());
            return Ok(Settings::default());
        }
        let json = fs::read_to_string(&self.path)?;
        let settings = serde_json::from_str(&json)
            .with_context(|| format!("Invalid settings file: {}", self.path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    /// Set one settings key from its string representation
    pub fn set(&self, key: &str, value: &str) -> Result<Settings> {
        let mut settings = self.load()?;
        match key {
            "default_project" => {
                settings.default_project = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "auto_detect" => {
                settings.auto_detect = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("auto_detect must be true or false"))?
            }
            "backend_url" => settings.backend_url = value.trim_end_matches('/').to_string(),
            "readability_url" => {
                settings.readability_url = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "session_cookie" => {
                settings.session_cookie = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            _ => anyhow::bail!(
                "Unknown setting '{}'. Known keys: default_project, auto_detect, \
                 backend_url, readability_url, session_cookie",
                key
            ),
        }
        self.save(&settings)?;
        Ok(settings)
    }

    /// Get one settings key as a string
    pub fn get(&self, key: &str) -> Result<String> {
        let settings = self.load()?;
        Ok(match key {
            "default_project" => settings.default_project.unwrap_or_default(),
            "auto_detect" => settings.auto_detect.to_string(),
            "backend_url" => settings.backend_url,
            "readability_url" => settings.readability_url.unwrap_or_default(),
            "session_cookie" => settings.session_cookie.unwrap_or_default(),
            _ => anyhow::bail!("Unknown setting '{}'", key),
        })
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;
