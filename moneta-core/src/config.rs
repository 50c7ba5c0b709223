//! Configuration management
//!
//! settings.json in the moneta directory:
//! ```json
//! {
//!   "api": { "baseUrl": "http://localhost:8080" }
//! }
//! ```
//! Fields this client doesn't know are kept when saving.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::http::DEFAULT_BASE_URL;

/// Environment variable that overrides `api.baseUrl`
pub const API_URL_ENV: &str = "MONETA_API_URL";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Where a setting's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Default,
    File,
    Env,
}

/// Moneta configuration (resolved view of settings)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub api_url: String,
    pub api_url_source: Source,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            api_url_source: Source::Default,
        }
    }
}

impl Config {
    /// Load config from the moneta directory; `MONETA_API_URL` wins over the file
    pub fn load(moneta_dir: &Path) -> Result<Self> {
        let raw = read_settings(moneta_dir)?;
        Ok(Self::resolve(&raw, std::env::var(API_URL_ENV).ok()))
    }

    fn resolve(raw: &SettingsFile, env_url: Option<String>) -> Self {
        let non_blank = |v: &String| !v.trim().is_empty();

        if let Some(url) = env_url.filter(non_blank) {
            return Self {
                api_url: url.trim().to_string(),
                api_url_source: Source::Env,
            };
        }
        match raw.api.base_url.clone().filter(non_blank) {
            Some(url) => Self {
                api_url: url.trim().to_string(),
                api_url_source: Source::File,
            },
            None => Self::default(),
        }
    }

    /// Persist `api.baseUrl`, preserving the rest of settings.json
    ///
    /// Refuses to touch a settings.json it cannot parse.
    pub fn save_api_url(moneta_dir: &Path, url: &str) -> Result<()> {
        let settings_path = moneta_dir.join("settings.json");
        let mut settings = parse_settings(&settings_path)?.ok_or_else(|| {
            anyhow!(
                "{} is not valid JSON; fix or remove it first",
                settings_path.display()
            )
        })?;
        settings.api.base_url = Some(url.trim().to_string());

        std::fs::create_dir_all(moneta_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

/// Unparseable settings read as defaults
fn read_settings(moneta_dir: &Path) -> Result<SettingsFile> {
    Ok(parse_settings(&moneta_dir.join("settings.json"))?.unwrap_or_default())
}

/// `None` when the file exists but is not valid settings JSON
fn parse_settings(settings_path: &Path) -> Result<Option<SettingsFile>> {
    if !settings_path.exists() {
        return Ok(Some(SettingsFile::default()));
    }
    let content = std::fs::read_to_string(settings_path)?;
    Ok(serde_json::from_str(&content).ok())
}
