use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::services::worker::WorkPlan;

/// User configuration from TaskRelay Config.yaml
///
/// Contains worker pacing, poll cadence and window settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(rename = "TaskRelay_Settings", default)]
    pub settings: RelaySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaySettings {
    #[serde(rename = "Step Count", default = "default_step_count")]
    pub step_count: u32,

    #[serde(rename = "Step Delay Ms", default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    #[serde(rename = "Poll Interval Ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(rename = "Listing Timeout", default = "default_listing_timeout")]
    pub listing_timeout: u64,

    #[serde(rename = "Listing Root", default)]
    pub listing_root: String,

    #[serde(rename = "Window Title", default = "default_window_title")]
    pub window_title: String,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            step_count: default_step_count(),
            step_delay_ms: default_step_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            listing_timeout: default_listing_timeout(),
            listing_root: String::new(),
            window_title: default_window_title(),
            debug_mode: false,
        }
    }
}

fn default_step_count() -> u32 {
    5
}

fn default_step_delay_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_listing_timeout() -> u64 {
    30
}

fn default_window_title() -> String {
    "Background Task Template".to_string()
}

/// Root listed when the config leaves `Listing Root` empty.
pub fn default_listing_root() -> Utf8PathBuf {
    if cfg!(target_os = "windows") {
        Utf8PathBuf::from("C:\\")
    } else {
        Utf8PathBuf::from("/")
    }
}

/// Errors raised by settings that would stall or break a run
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Poll Interval Ms must be greater than zero")]
    ZeroPollInterval,

    #[error("Listing Timeout must be greater than zero")]
    ZeroListingTimeout,
}

impl RelaySettings {
    /// Reject settings the poll loop or worker cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.listing_timeout == 0 {
            return Err(ConfigError::ZeroListingTimeout);
        }
        Ok(())
    }

    pub fn work_plan(&self) -> WorkPlan {
        WorkPlan {
            steps: self.step_count,
            step_delay: Duration::from_millis(self.step_delay_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout)
    }

    pub fn listing_root(&self) -> Utf8PathBuf {
        if self.listing_root.trim().is_empty() {
            default_listing_root()
        } else {
            Utf8PathBuf::from(self.listing_root.trim())
        }
    }
}
