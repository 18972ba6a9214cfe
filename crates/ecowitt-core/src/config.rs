//! Device configuration.
//!
//! A [`DeviceConfig`] gathers every tunable of a [`crate::Device`] so that
//! front ends can load it from a file. Durations are written as seconds.
//!
//! ```
//! use ecowitt_core::DeviceConfig;
//!
//! let config: DeviceConfig = serde_json::from_str(r#"{
//!     "ip": "192.168.1.20",
//!     "socket_timeout": 1.5,
//!     "retry": { "max_tries": 5 }
//! }"#).unwrap();
//! assert_eq!(config.port, 45000);
//! assert_eq!(config.retry.max_tries, 5);
//! config.validate().unwrap();
//! ```

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ecowitt_types::{DEFAULT_PORT, DiscoveryMethod};

use crate::discovery::DiscoveryOptions;
use crate::error::{Error, Result};
use crate::parser::UnknownFieldPolicy;
use crate::retry::RetryConfig;
use crate::sensors::SensorOptions;

/// Default socket timeout for TCP commands.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for a single gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Gateway address. Discovered when absent.
    pub ip: Option<IpAddr>,
    pub port: u16,
    #[serde(with = "duration_secs")]
    pub socket_timeout: Duration,
    pub retry: RetryConfig,
    pub discovery: DiscoveryOptions,
    pub sensors: SensorOptions,
    pub log_unknown_fields: bool,
    pub unknown_fields: UnknownFieldPolicy,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ip: None,
            port: DEFAULT_PORT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            retry: RetryConfig::default(),
            discovery: DiscoveryOptions::default(),
            sensors: SensorOptions::default(),
            log_unknown_fields: false,
            unknown_fields: UnknownFieldPolicy::default(),
        }
    }
}

impl DeviceConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn discovery(mut self, discovery: DiscoveryOptions) -> Self {
        self.discovery = discovery;
        self
    }

    #[must_use]
    pub fn sensors(mut self, sensors: SensorOptions) -> Self {
        self.sensors = sensors;
        self
    }

    #[must_use]
    pub fn log_unknown_fields(mut self, enabled: bool) -> Self {
        self.log_unknown_fields = enabled;
        self
    }

    #[must_use]
    pub fn unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Check the configuration for values the gateway cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::invalid_config("port must not be 0"));
        }
        if self.socket_timeout.is_zero() {
            return Err(Error::invalid_config("socket_timeout must be greater than 0"));
        }
        if self.retry.max_tries == 0 {
            return Err(Error::invalid_config("retry.max_tries must be at least 1"));
        }
        if self.discovery.timeout.is_zero() {
            return Err(Error::invalid_config(
                "discovery.timeout must be greater than 0",
            ));
        }
        if self.discovery.listen_period.is_zero() {
            return Err(Error::invalid_config(
                "discovery.listen_period must be greater than 0",
            ));
        }
        if self.discovery.method == DiscoveryMethod::Configured {
            return Err(Error::invalid_config(
                "discovery.method must be broadcast or listen",
            ));
        }
        Ok(())
    }
}

/// Serde adapter writing a [`Duration`] as fractional seconds.
pub mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DeviceConfig::default();
        assert_eq!(config.port, 45000);
        assert_eq!(config.socket_timeout, Duration::from_secs(2));
        assert!(config.ip.is_none());
        assert!(config.sensors.use_wh32);
        assert!(config.sensors.ignore_wh40_batt);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            DeviceConfig::new().port(0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(DeviceConfig::new()
            .socket_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(DeviceConfig::new()
            .retry(RetryConfig::new(0))
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_discovery_options() {
        let zero_period = DeviceConfig::new()
            .discovery(DiscoveryOptions::new().listen_period(Duration::ZERO));
        assert!(matches!(zero_period.validate(), Err(Error::InvalidConfig(_))));

        let zero_timeout =
            DeviceConfig::new().discovery(DiscoveryOptions::new().timeout(Duration::ZERO));
        assert!(zero_timeout.validate().is_err());

        let configured = DeviceConfig::new()
            .discovery(DiscoveryOptions::new().method(DiscoveryMethod::Configured));
        assert!(configured.validate().is_err());

        let listen =
            DeviceConfig::new().discovery(DiscoveryOptions::new().method(DiscoveryMethod::Listen));
        listen.validate().unwrap();
    }

    #[test]
    fn test_serde_round_trip() {
        let config = DeviceConfig::new()
            .ip("10.0.0.5".parse().unwrap())
            .socket_timeout(Duration::from_millis(1500))
            .unknown_fields(UnknownFieldPolicy::Fail);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"socket_timeout\":1.5"));
        assert!(json.contains("\"unknown_fields\":\"fail\""));
        let back: DeviceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let result = serde_json::from_str::<DeviceConfig>(r#"{"socket_timeout": -1.0}"#);
        assert!(result.is_err());
    }
}
