//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::engine::LinkSettings;
use crate::error::{Result, RobotLinkError};

/// Baud rates the co-processor firmware supports
pub const SUPPORTED_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200, 230400];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub watchdog: WatchdogConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// UDP listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Co-processor serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Records allowed to wait for the port
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

/// Wire identity
#[derive(Debug, Deserialize, Clone)]
pub struct ProtocolConfig {
    #[serde(default = "default_protocol_version")]
    pub version: u8,

    #[serde(default = "default_device_id")]
    pub device_id: u8,

    #[serde(default = "default_firmware_version")]
    pub firmware_version: u8,
}

/// Enable watchdog timing
#[derive(Debug, Deserialize, Clone)]
pub struct WatchdogConfig {
    #[serde(default = "default_watchdog_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_startup_lockout_ms")]
    pub startup_lockout_ms: u64,
}

/// Poll loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_poll_rate_hz")]
    pub poll_rate_hz: u32,

    #[serde(default = "default_log_interval_polls")]
    pub log_interval_polls: u64,
}

/// JSONL link recorder configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,
}

/// Application log output
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily rolling log files; empty logs to stdout only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { crate::net::DEFAULT_PORT }

fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { crate::serial::COPROCESSOR_BAUD_RATE }
fn default_queue_depth() -> usize { 32 }

fn default_protocol_version() -> u8 { crate::protocol::frame::PROTOCOL_VERSION }
fn default_device_id() -> u8 { crate::protocol::frame::device_id::CONTROLLER }
fn default_firmware_version() -> u8 { crate::protocol::frame::FIRMWARE_VERSION }

fn default_watchdog_timeout_ms() -> u64 { 250 }
fn default_startup_lockout_ms() -> u64 { 500 }

fn default_poll_rate_hz() -> u32 { 100 }
fn default_log_interval_polls() -> u64 { 1000 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 1000 }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            version: default_protocol_version(),
            device_id: default_device_id(),
            firmware_version: default_firmware_version(),
        }
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_watchdog_timeout_ms(),
            startup_lockout_ms: default_startup_lockout_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            poll_rate_hz: default_poll_rate_hz(),
            log_interval_polls: default_log_interval_polls(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> RobotLinkError {
    RobotLinkError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use robot_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        self.network
            .bind_address
            .parse::<IpAddr>()
            .map_err(|e| invalid(format!("bind_address '{}' is invalid: {}", self.network.bind_address, e)))?;

        if self.network.port == 0 {
            return Err(invalid("network port must not be 0"));
        }

        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                SUPPORTED_BAUD_RATES
            )));
        }

        if self.serial.queue_depth == 0 {
            return Err(invalid("queue_depth must be greater than 0"));
        }

        if self.watchdog.timeout_ms == 0 || self.watchdog.timeout_ms > 10000 {
            return Err(invalid("watchdog timeout_ms must be between 1 and 10000"));
        }

        if self.watchdog.startup_lockout_ms > 60000 {
            return Err(invalid("startup_lockout_ms must be at most 60000"));
        }

        if self.control.poll_rate_hz == 0 || self.control.poll_rate_hz > 1000 {
            return Err(invalid("poll_rate_hz must be between 1 and 1000"));
        }

        if self.control.log_interval_polls == 0 {
            return Err(invalid("log_interval_polls must be greater than 0"));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(invalid("log_interval_ms must be between 1 and 60000"));
        }

        Ok(())
    }

    /// Address the UDP listener binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .network
            .bind_address
            .parse()
            .map_err(|e| invalid(format!("bind_address '{}' is invalid: {}", self.network.bind_address, e)))?;
        Ok(SocketAddr::new(ip, self.network.port))
    }

    /// Engine identity and timing
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            protocol_version: self.protocol.version,
            device_id: self.protocol.device_id,
            firmware_version: self.protocol.firmware_version,
            frame_timeout: Duration::from_millis(self.watchdog.timeout_ms),
            startup_lockout: Duration::from_millis(self.watchdog.startup_lockout_ms),
        }
    }

    /// Poll loop period
    pub fn poll_period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.control.poll_rate_hz.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        assert_eq!(config.network.port, 22211);
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.protocol.version, 0x02);
        assert_eq!(config.protocol.device_id, 0xFF);
        assert_eq!(config.watchdog.timeout_ms, 250);
        assert_eq!(config.watchdog.startup_lockout_ms, 500);
        assert_eq!(config.control.poll_rate_hz, 100);
        assert!(config.logging.log_dir.is_empty());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.network.bind_address, "0.0.0.0");
        assert_eq!(config.serial.queue_depth, 32);
        assert_eq!(config.telemetry.max_files_to_keep, 10);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[network]
port = 30000

[serial]
port = "/dev/ttyACM0"
baud_rate = 57600

[protocol]
version = 3

[watchdog]
timeout_ms = 400
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.network.port, 30000);
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.protocol.version, 3);
        assert_eq!(config.watchdog.timeout_ms, 400);
        assert_eq!(config.watchdog.startup_lockout_ms, 500);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/robot-link.toml");
        assert!(matches!(result, Err(RobotLinkError::Io(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = Config::from_toml("[network\nport = 1");
        assert!(matches!(result, Err(RobotLinkError::Config(_))));
    }

    #[test]
    fn test_link_settings() {
        let mut config = Config::default();
        config.protocol.version = 0x05;
        config.watchdog.timeout_ms = 300;

        let settings = config.link_settings();
        assert_eq!(settings.protocol_version, 0x05);
        assert_eq!(settings.device_id, 0xFF);
        assert_eq!(settings.firmware_version, 0x01);
        assert_eq!(settings.frame_timeout, Duration::from_millis(300));
        assert_eq!(settings.startup_lockout, Duration::from_millis(500));
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr().unwrap(), "0.0.0.0:22211".parse().unwrap());
    }

    #[test]
    fn test_poll_period() {
        let config = Config::default();
        assert_eq!(config.poll_period(), Duration::from_millis(10));
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = Config::default();
        config.network.bind_address = "not-an-ip".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_port_zero() {
        let mut config = Config::default();
        config.network.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = Config::default();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_queue_depth_zero() {
        let mut config = Config::default();
        config.serial.queue_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_watchdog_timeout_bounds() {
        let mut config = Config::default();
        config.watchdog.timeout_ms = 0;
        assert!(config.validate().is_err());

        config.watchdog.timeout_ms = 10001;
        assert!(config.validate().is_err());

        config.watchdog.timeout_ms = 10000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_startup_lockout_too_high() {
        let mut config = Config::default();
        config.watchdog.startup_lockout_ms = 60001;
        assert!(config.validate().is_err());

        config.watchdog.startup_lockout_ms = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poll_rate_bounds() {
        let mut config = Config::default();
        config.control.poll_rate_hz = 0;
        assert!(config.validate().is_err());

        config.control.poll_rate_hz = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = Config::default();
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = Config::default();
        config.telemetry.enabled = false;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_telemetry_limits_zero() {
        let mut config = Config::default();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.telemetry.log_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
