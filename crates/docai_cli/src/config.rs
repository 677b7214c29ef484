//! RON configuration file for the command line.
//!
//! Every field is optional in the file; anything missing takes the client
//! default. Durations are stored in milliseconds.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docai_client::ClientSettings;
use docai_core::non_empty;
use docai_logging::{docai_debug, docai_info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = ".docai.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub trigger_source: String,
    pub auth_token: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        let settings = ClientSettings::default();
        Self {
            base_url: settings.base_url,
            api_prefix: settings.api_prefix,
            connect_timeout_ms: millis(settings.connect_timeout),
            request_timeout_ms: millis(settings.request_timeout),
            poll_interval_ms: millis(settings.poll_interval),
            timeout_ms: millis(settings.wait_timeout),
            trigger_source: settings.trigger_source,
            auth_token: None,
        }
    }
}

impl CliConfig {
    /// Apply command-line overrides. Empty values are ignored.
    pub fn apply_overrides(
        &mut self,
        base_url: Option<String>,
        api_prefix: Option<String>,
        auth_token: Option<String>,
    ) {
        if let Some(base_url) = non_empty(base_url) {
            self.base_url = base_url;
        }
        if let Some(api_prefix) = api_prefix {
            self.api_prefix = api_prefix;
        }
        if let Some(token) = non_empty(auth_token) {
            self.auth_token = Some(token);
        }
    }

    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            api_prefix: self.api_prefix.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            wait_timeout: Duration::from_millis(self.timeout_ms),
            trigger_source: self.trigger_source.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to write config {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Load the config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<CliConfig, ConfigFileError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            docai_debug!("no config at {:?}, using defaults", path);
            return Ok(CliConfig::default());
        }
        Err(source) => {
            return Err(ConfigFileError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = ron::from_str(&content).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    docai_info!("loaded config from {:?}", path);
    Ok(config)
}

pub fn save_config(path: &Path, config: &CliConfig) -> Result<(), ConfigFileError> {
    let content = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::new())?;
    fs::write(path, content).map_err(|source| ConfigFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
