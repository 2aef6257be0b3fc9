//! Configuration - watch session limits and the settings file
//!
//! `WatchConfig` bounds a single watch session. `Settings` is the YAML file
//! under `~/.surebank` that holds the API location, auth and deep-link markers.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Result, WatchError};
use crate::models::AuthType;

/// Limits for one watch session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchConfig {
    /// Status checks allowed before giving up
    pub max_attempts: u32,
    /// Delay between scheduled checks
    pub poll_interval: Duration,
    /// Wall-clock limit for the whole session
    pub timeout: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Per-call overrides passed to `PaymentWatcher::start`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WatchOverrides {
    pub max_attempts: Option<u32>,
    pub poll_interval: Option<Duration>,
    pub timeout: Option<Duration>,
}

impl WatchConfig {
    pub fn with_overrides(mut self, overrides: Option<WatchOverrides>) -> Self {
        if let Some(o) = overrides {
            if let Some(max_attempts) = o.max_attempts {
                self.max_attempts = max_attempts;
            }
            if let Some(poll_interval) = o.poll_interval {
                self.poll_interval = poll_interval;
            }
            if let Some(timeout) = o.timeout {
                self.timeout = timeout;
            }
        }
        self
    }

    /// At least one attempt, timers between 1ms and `MAX_WATCH_DURATION_SECS`.
    /// Tokio intervals panic on zero and `Instant` arithmetic overflows near `Duration::MAX`.
    pub fn normalized(self) -> Self {
        let floor = Duration::from_millis(1);
        let ceiling = Duration::from_secs(MAX_WATCH_DURATION_SECS);
        WatchConfig {
            max_attempts: self.max_attempts.max(1),
            poll_interval: self.poll_interval.clamp(floor, ceiling),
            timeout: self.timeout.clamp(floor, ceiling),
        }
    }
}

/// Watch defaults as stored in the settings file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchDefaults {
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for WatchDefaults {
    fn default() -> Self {
        WatchDefaults {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl From<&WatchDefaults> for WatchConfig {
    fn from(d: &WatchDefaults) -> Self {
        WatchConfig {
            max_attempts: d.max_attempts,
            poll_interval: Duration::from_millis(d.poll_interval_ms),
            timeout: Duration::from_secs(d.timeout_secs),
        }
    }
}

/// Deep-link scheme and the markers used to read gateway redirects
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepLinkSettings {
    pub scheme: String,
    pub host: String,
    pub success_markers: Vec<String>,
    pub error_markers: Vec<String>,
    pub cancel_markers: Vec<String>,
}

impl Default for DeepLinkSettings {
    fn default() -> Self {
        let owned = |markers: &[&str]| markers.iter().map(|m| m.to_string()).collect();
        DeepLinkSettings {
            scheme: DEEP_LINK_SCHEME.to_string(),
            host: DEEP_LINK_HOST.to_string(),
            success_markers: owned(SUCCESS_MARKERS),
            error_markers: owned(ERROR_MARKERS),
            cancel_markers: owned(CANCEL_MARKERS),
        }
    }
}

/// Contents of `~/.surebank/config.yaml`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub status_path: String,
    pub auth: AuthType,
    pub request_timeout_secs: u64,
    pub watch: WatchDefaults,
    pub deep_link: DeepLinkSettings,
    pub log_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: DEFAULT_API_URL.to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
            auth: AuthType::None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            watch: WatchDefaults::default(),
            deep_link: DeepLinkSettings::default(),
            log_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Default location of the settings file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Load settings; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Settings> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)
            .map_err(|e| WatchError::Config(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_base_url)
            .map_err(|e| WatchError::Config(format!("api_base_url: {}", e)))?;
        if !self.status_path.contains(REFERENCE_PLACEHOLDER) {
            return Err(WatchError::Config(format!(
                "status_path must contain {}",
                REFERENCE_PLACEHOLDER
            )));
        }
        if self.deep_link.scheme.is_empty() {
            return Err(WatchError::Config("deep_link.scheme is empty".to_string()));
        }
        Ok(())
    }

    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig::from(&self.watch)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
