use crate::errors::{PageError, Result};
use crate::types::BrowserConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub org: OrgConfig,
    pub timeouts: TimeoutConfig,
    pub message_poll: MessagePollConfig,
    pub screenshots: ScreenshotConfig,
}

/// Where the settings page lives inside the org.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgConfig {
    /// Lightning base address, e.g. `https://acme.lightning.force.com`.
    pub base_url: String,
    pub namespace_prefix: String,
    pub object_name: String,
    pub frame_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub element_ms: u64,
    pub button_visible_ms: u64,
    pub rollups_ms: u64,
    pub loading_ms: u64,
    pub advanced_mapping_load_ms: u64,
    pub settle_ms: u64,
    pub navigation_settle_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagePollConfig {
    pub attempts: u32,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    pub enabled: bool,
    pub directory: Option<PathBuf>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.message_poll.attempts == 0 {
            return Err(PageError::Configuration(
                "message_poll.attempts must be at least 1".to_string(),
            ));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(PageError::Configuration(
                "timeouts.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.org.frame_title.trim().is_empty() {
            return Err(PageError::Configuration(
                "org.frame_title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for OrgConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            namespace_prefix: String::new(),
            object_name: "NPSP_Settings".to_string(),
            frame_title: "Nonprofit Success Pack Settings".to_string(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            element_ms: 30_000,
            button_visible_ms: 60_000,
            rollups_ms: 90_000,
            loading_ms: 30_000,
            advanced_mapping_load_ms: 30_000,
            settle_ms: 2_000,
            navigation_settle_ms: 2_000,
            poll_interval_ms: 200,
        }
    }
}

impl TimeoutConfig {
    pub fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for MessagePollConfig {
    fn default() -> Self {
        Self {
            attempts: 13,
            interval_ms: 10_000,
        }
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}
