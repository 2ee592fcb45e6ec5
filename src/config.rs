//! Configuration and locally persisted state

use crate::state::models::Session;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_BACKEND_URL: &str = "SURVEYDESK_BACKEND_URL";
pub const ENV_API_KEY: &str = "SURVEYDESK_API_KEY";
pub const ENV_REDIRECT_URL: &str = "SURVEYDESK_REDIRECT_URL";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "surveydesk", "surveydesk")
}

fn read_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Project URL of the hosted backend
    pub backend_url: Option<String>,
    /// Public (anon) API key
    pub api_key: Option<String>,
    /// Where OAuth and password-reset links send the user back to
    pub redirect_url: Option<String>,
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load the config file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        read_json(path)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    /// Replace fields with non-empty values returned by `lookup`
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v: &String| !v.is_empty());
        if let Some(url) = read(ENV_BACKEND_URL) {
            self.backend_url = Some(url);
        }
        if let Some(key) = read(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = read(ENV_REDIRECT_URL) {
            self.redirect_url = Some(url);
        }
        self
    }

    pub fn backend_url(&self) -> Result<&str> {
        self.backend_url
            .as_deref()
            .with_context(|| format!("backend url is not configured (set {ENV_BACKEND_URL})"))
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .with_context(|| format!("api key is not configured (set {ENV_API_KEY})"))
    }
}

/// State kept between runs: the pending invite slot and the last session
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LocalState {
    #[serde(default)]
    pub pending_invite_token: Option<String>,
    #[serde(default)]
    pub session: Option<Session>,
}

impl LocalState {
    pub fn state_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.data_dir().join("state.json"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        read_json(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}
