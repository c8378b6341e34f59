use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Result, WrapErr, bail};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::summary::DEFAULT_SUMMARY_WORDS;
use crate::transcript::default_languages;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory holding `logo.png`
    pub static_dir: PathBuf,
    /// Directory served under `/.well-known`; must contain `ai-plugin.json`
    pub well_known_dir: PathBuf,
    pub languages: Vec<String>,
    pub summary_words: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
            well_known_dir: PathBuf::from(".well-known"),
            languages: default_languages(),
            summary_words: DEFAULT_SUMMARY_WORDS,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config =
                toml::from_str(&content).wrap_err_with(|| format!("invalid config file {}", path.display()))?;
            if config.summary_words == 0 {
                bail!("summary_words in {} must be at least 1", path.display());
            }
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}
