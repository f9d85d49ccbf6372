//! TOML-based configuration for the relay.
//!
//! The config file path is given on the command line (default `config.toml`
//! in the working directory).  A missing file is not an error: the relay
//! starts with defaults.
//!
//! # What is TOML? (for beginners)
//!
//! TOML (Tom's Obvious Minimal Language) is a configuration file format designed
//! to be easy to read and write.  It looks similar to INI files but with more
//! data types.  Example:
//!
//! ```toml
//! [relay]
//! listen_port = 39539
//! destinations = ["127.0.0.1:39540", "192.168.1.20:39539"]
//!
//! [filter]
//! threshold = 0.05
//! tracked_bones = ["LeftHand", "RightHand"]
//! ```
//!
//! The `serde` library provides automatic serialisation/deserialisation between
//! Rust structs and TOML text.  The `#[derive(Serialize, Deserialize)]` macros
//! generate all the boilerplate code at compile time.
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  Whole sections
//! may be omitted as well.
//!
//! # Legacy JSON
//!
//! Older setups used a flat JSON file:
//!
//! ```json
//! { "ListenTo": 39539, "ReflectTo": ["127.0.0.1:39540"], "LogDiff": 0.05 }
//! ```
//!
//! A path ending in `.json` is read in that format; every other setting takes
//! its default.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vmc_core::DEFAULT_TRACKED_BONES;

use crate::infrastructure::network::relay_listener::ListenerSettings;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The legacy JSON content could not be parsed.
    #[error("failed to parse legacy JSON config: {0}")]
    ParseJson(#[from] serde_json::Error),

    /// A destination is not of the form `host:port`.
    #[error("invalid destination {0:?}, expected host:port")]
    InvalidDestination(String),

    /// The bind address is not an IP address.
    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    /// The threshold is negative or not finite.
    #[error("invalid threshold {0}, must be a finite value >= 0")]
    InvalidThreshold(f32),

    /// The receive buffer size is out of range.
    #[error("invalid max_datagram_size {0}, must be within 512..=65535")]
    InvalidDatagramSize(usize),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sockets, buffers and loop timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    /// UDP port the sender streams to.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// IP address to bind the inbound socket to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Consumers, as `host:port`, in send order.
    #[serde(default = "default_destinations")]
    pub destinations: Vec<String>,
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_idle_warning_secs")]
    pub idle_warning_secs: u64,
    /// `0` disables the periodic statistics log.
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

/// Rotation filter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterConfig {
    /// Largest per-axis change in radians that is still suppressed.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Bone names whose updates go through the filter.
    #[serde(default = "default_tracked_bones")]
    pub tracked_bones: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// The flat JSON format of older installations.
#[derive(Debug, Deserialize)]
struct LegacyConfig {
    #[serde(rename = "ListenTo")]
    listen_to: Option<u16>,
    #[serde(rename = "ReflectTo")]
    reflect_to: Option<Vec<String>>,
    #[serde(rename = "LogDiff")]
    log_diff: Option<f32>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_listen_port() -> u16 {
    39539
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_destinations() -> Vec<String> {
    vec!["127.0.0.1:39540".to_string()]
}
fn default_max_datagram_size() -> usize {
    1536
}
fn default_read_timeout_ms() -> u64 {
    1000
}
fn default_idle_warning_secs() -> u64 {
    5
}
fn default_stats_interval_secs() -> u64 {
    30
}
fn default_threshold() -> f32 {
    0.05
}
fn default_tracked_bones() -> Vec<String> {
    DEFAULT_TRACKED_BONES.iter().map(|b| b.to_string()).collect()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            bind_address: default_bind_address(),
            destinations: default_destinations(),
            max_datagram_size: default_max_datagram_size(),
            read_timeout_ms: default_read_timeout_ms(),
            idle_warning_secs: default_idle_warning_secs(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            tracked_bones: default_tracked_bones(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl From<LegacyConfig> for AppConfig {
    fn from(legacy: LegacyConfig) -> Self {
        let mut cfg = AppConfig::default();
        if let Some(port) = legacy.listen_to {
            cfg.relay.listen_port = port;
        }
        if let Some(destinations) = legacy.reflect_to {
            cfg.relay.destinations = destinations;
        }
        if let Some(threshold) = legacy.log_diff {
            cfg.filter.threshold = threshold;
        }
        cfg
    }
}

// ── Derived settings ──────────────────────────────────────────────────────────

impl AppConfig {
    /// Checks every value the relay cannot start with.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.filter.threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if !(512..=65535).contains(&self.relay.max_datagram_size) {
            return Err(ConfigError::InvalidDatagramSize(self.relay.max_datagram_size));
        }
        self.relay
            .bind_address
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidBindAddress(self.relay.bind_address.clone()))?;
        if let Some(bad) = self
            .relay
            .destinations
            .iter()
            .find(|d| !is_host_port(d))
        {
            return Err(ConfigError::InvalidDestination(bad.clone()));
        }
        Ok(())
    }

    /// The inbound socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindAddress`] if the bind address is not
    /// an IP address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .relay
            .bind_address
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(self.relay.bind_address.clone()))?;
        Ok(SocketAddr::new(ip, self.relay.listen_port))
    }

    pub fn listener_settings(&self) -> ListenerSettings {
        let stats_interval = match self.relay.stats_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        ListenerSettings {
            max_datagram_size: self.relay.max_datagram_size,
            read_timeout: Duration::from_millis(self.relay.read_timeout_ms.max(1)),
            idle_warning: Duration::from_secs(self.relay.idle_warning_secs),
            stats_interval,
        }
    }
}

/// `host:port` with a non-empty host and a numeric port.  IPv6 hosts must be
/// bracketed.
fn is_host_port(s: &str) -> bool {
    match s.rsplit_once(':') {
        Some((host, port)) => {
            let host_ok = !host.is_empty()
                && (!host.contains(':') || (host.starts_with('[') && host.ends_with(']')));
            host_ok && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Parses TOML config text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_toml(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Parses the legacy flat JSON format.
///
/// # Errors
///
/// Returns [`ConfigError::ParseJson`] if the JSON is malformed.
pub fn parse_legacy_json(content: &str) -> Result<AppConfig, ConfigError> {
    let legacy: LegacyConfig = serde_json::from_str(content)?;
    Ok(legacy.into())
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.  The result is not validated; command-line overrides
/// are applied first.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and a parse error if the content is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json {
                parse_legacy_json(&content)
            } else {
                parse_toml(&content)
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
