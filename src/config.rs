use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunker::DEFAULT_MAX_REQUEST_BYTES;
use crate::error::{TranslatorError, TranslatorResult};

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_request_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BYTES
}

fn default_temp_dir() -> PathBuf {
    env::temp_dir().join("deepl-handler")
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("deepl-settings.json")
}

/// Runtime configuration of the handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Timeout for each individual provider request
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Request ceiling in bytes of text content
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
    /// Root under which translated documents are written
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Override of the DeepL endpoint; chosen from the key when unset
    #[serde(default)]
    pub api_url: Option<String>,
    /// JSON file used as settings store by the command line tool
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_request_bytes: default_max_request_bytes(),
            temp_dir: default_temp_dir(),
            api_url: None,
            settings_path: default_settings_path(),
        }
    }
}

impl HandlerConfig {
    /// Defaults overridden by `DEEPL_*` environment variables
    ///
    /// Unparsable numeric values fall back to their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout_seconds = env::var("DEEPL_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_seconds);

        let max_request_bytes = env::var("DEEPL_MAX_REQUEST_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_request_bytes);

        let temp_dir = env::var("DEEPL_TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.temp_dir);

        let api_url = env::var("DEEPL_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let settings_path = env::var("DEEPL_SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.settings_path);

        Self {
            timeout_seconds,
            max_request_bytes,
            temp_dir,
            api_url,
            settings_path,
        }
    }

    /// Read a JSON config file; missing fields take their defaults
    pub fn load_from_file(path: &Path) -> TranslatorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslatorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| TranslatorError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
