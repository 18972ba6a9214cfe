//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use ecowitt_core::{DeviceConfig, RetryConfig};
use serde::{Deserialize, Serialize};

use crate::cli::{GatewayArgs, OutputFormat};

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default output format
    #[serde(default)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,

    /// Gateway connection, discovery and decoding settings
    #[serde(default)]
    pub gateway: DeviceConfig,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ecowitt")
            .join("config.toml")
    }

    /// Load config from `path`, warning and falling back to defaults when it
    /// cannot be read.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load config from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .gateway
            .validate()
            .with_context(|| format!("Invalid gateway settings in {}", path.display()))?;
        Ok(config)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Combine the configured gateway settings with command line overrides.
///
/// Flags win over the config file. Timeouts must be positive.
pub fn resolve_gateway(args: &GatewayArgs, config: &Config) -> Result<DeviceConfig> {
    let mut gateway = config.gateway.clone();
    if let Some(ip) = args.ip {
        gateway = gateway.ip(ip);
    }
    if let Some(port) = args.port {
        gateway = gateway.port(port);
    }
    if let Some(secs) = args.timeout {
        gateway = gateway.socket_timeout(seconds(secs)?);
    }
    if let Some(tries) = args.max_tries {
        let retry = RetryConfig::new(tries).retry_wait(gateway.retry.retry_wait);
        gateway = gateway.retry(retry);
    }
    gateway.validate()?;
    Ok(gateway)
}

/// Parse a positive number of seconds.
pub fn seconds(secs: f64) -> Result<Duration> {
    let duration = Duration::try_from_secs_f64(secs)
        .with_context(|| format!("Invalid duration: {} seconds", secs))?;
    anyhow::ensure!(!duration.is_zero(), "Duration must be greater than zero");
    Ok(duration)
}
