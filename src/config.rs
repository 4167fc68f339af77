use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::metadata::DEFAULT_DATA_URL;
use crate::render::{DEFAULT_CDN_URL, OutputMode};

pub const CONFIG_ENV: &str = "CDN_HTML_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HelperConfig {
    #[serde(default)]
    pub cdn: CdnSection,
    #[serde(default)]
    pub metadata: MetadataSettings,
    #[serde(default)]
    pub render: RenderSection,
    /// Extra extension -> template pairs layered over the built-in set.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CdnSection {
    #[serde(default = "default_cdn_url")]
    pub url: String,
}

impl Default for CdnSection {
    fn default() -> Self {
        Self {
            url: default_cdn_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    pub url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Extra attempts after a transport error or 5xx response.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATA_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 2,
            retry_backoff_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RenderSection {
    #[serde(default)]
    pub output: OutputMode,
    #[serde(default)]
    pub missing_files: MissingFilePolicy,
}

/// What registration does when a requested file suffix is absent from the
/// version listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFilePolicy {
    /// Warn, record the alias as missing, and keep registering the rest.
    #[default]
    Skip,
    /// Abort the registration with an error.
    Fail,
}

fn default_cdn_url() -> String {
    DEFAULT_CDN_URL.to_string()
}

pub fn load() -> Result<HelperConfig> {
    let path_override = std::env::var(CONFIG_ENV).ok();
    load_from(path_override.as_deref())
}

pub fn load_from(path_override: Option<&str>) -> Result<HelperConfig> {
    let Some(path) = config_path_override(path_override) else {
        return Ok(HelperConfig::default());
    };

    if !path.exists() {
        return Ok(HelperConfig::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: HelperConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    Ok(config)
}

fn config_path_override(path_override: Option<&str>) -> Option<PathBuf> {
    if let Some(raw) = path_override {
        return Some(PathBuf::from(raw));
    }
    config_path()
}

pub fn config_path() -> Option<PathBuf> {
    // Prefer the XDG-style location; fall back to ~/.cdn-html-helper/config.toml.
    if let Some(mut dir) = dirs::config_dir() {
        dir.push("cdn-html-helper");
        dir.push("config.toml");
        if dir.exists() {
            return Some(dir);
        }
    }
    dirs::home_dir().map(|mut home| {
        home.push(".cdn-html-helper");
        home.push("config.toml");
        home
    })
}
