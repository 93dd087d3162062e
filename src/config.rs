//! # Configuration
//!
//! A single TOML file with three sections. Every field has a default, so a
//! missing file or a partial one still yields a usable setup:
//!
//! ```toml
//! [device]
//! vendor_id = 0x0810
//! product_id = 0x0003
//! # path = "/dev/hidraw3"   # skips discovery
//!
//! [sampling]
//! poll_interval_ms = 50
//! startup_delay_ms = 1500
//! max_consecutive_errors = 10
//! stats_interval_secs = 10
//!
//! [display]
//! show_raw = true
//! clear_screen = true
//! ```
//!
//! Command line flags override whatever the file says (see [`crate::cli`]).

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::controller::device_discovery::{DeviceId, DEFAULT_PRODUCT_ID, DEFAULT_VENDOR_ID};
use crate::controller::sample_loop::SamplerSettings;
use crate::display::DisplaySettings;

pub const CONFIG_DIR_NAME: &str = "padpilot";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceSettings,
    pub sampling: SamplingSettings,
    pub display: DisplaySettings,
}

/// Which gamepad to read.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct DeviceSettings {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Explicit device node, bypasses discovery
    pub path: Option<PathBuf>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            vendor_id: DEFAULT_VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
            path: None,
        }
    }
}

impl DeviceSettings {
    pub fn id(&self) -> DeviceId {
        DeviceId {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct SamplingSettings {
    pub poll_interval_ms: u64,
    /// Pause between finding the device and the first read
    pub startup_delay_ms: u64,
    pub max_consecutive_errors: u32,
    pub stats_interval_secs: u32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        let sampler = SamplerSettings::default();
        Self {
            poll_interval_ms: sampler.poll_interval_ms,
            startup_delay_ms: 1500,
            max_consecutive_errors: sampler.max_consecutive_errors,
            stats_interval_secs: sampler.stats_interval_secs,
        }
    }
}

impl SamplingSettings {
    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            poll_interval_ms: self.poll_interval_ms,
            max_consecutive_errors: self.max_consecutive_errors.max(1),
            stats_interval_secs: self.stats_interval_secs.max(1),
        }
    }
}

impl Config {
    /// `<config dir>/padpilot/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| eyre!("Failed to parse config: {}", e))
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        let exists = tokio::fs::try_exists(path)
            .await
            .wrap_err_with(|| format!("Failed to check config file {}", path.display()))?;

        if !exists {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        let config =
            Self::from_toml(&content).wrap_err_with(|| format!("In {}", path.display()))?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Load from `path` or the default location; defaults when neither exists.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path).await,
            None => match Self::default_path() {
                Some(path) => Self::load(&path).await,
                None => Ok(Self::default()),
            },
        }
    }
}
