//! Application Configuration
//!
//! Scanner settings stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::analysis::ExpiryPolicy;
use crate::session::ScannerConfig;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Scan pipeline settings
    pub scan: ScanSettings,
    /// User feedback settings
    pub feedback: FeedbackSettings,
}

impl AppConfig {
    /// Build the scanner configuration from these settings
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            throttle_interval: Duration::from_millis(self.scan.throttle_interval_ms),
            stability_threshold: self.scan.stability_threshold.max(1),
            session_timeout: self.scan.session_timeout_secs.map(Duration::from_secs),
            expiry_policy: self.scan.expiry_policy,
            masked_preview: self.feedback.masked_preview,
            haptics: self.feedback.haptics,
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Scan pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Minimum milliseconds between processed frames
    pub throttle_interval_ms: u64,
    /// Consecutive matching frames required to accept a number
    pub stability_threshold: u32,
    /// Give up after this many seconds without a result
    pub session_timeout_secs: Option<u64>,
    /// Expiry date strictness
    pub expiry_policy: ExpiryPolicy,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            throttle_interval_ms: 200,
            stability_threshold: 2,
            session_timeout_secs: None,
            expiry_policy: ExpiryPolicy::YearOnly,
        }
    }
}

/// User feedback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    /// Show a masked card number while confirming
    pub masked_preview: bool,
    /// Haptic feedback on success
    pub haptics: bool,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            masked_preview: true,
            haptics: true,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
