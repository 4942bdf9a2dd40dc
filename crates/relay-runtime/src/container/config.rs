//! # Relay Configuration
//!
//! Unified configuration for every subsystem. All values have defaults;
//! a host can deserialize the whole tree or override single values through
//! `VR_*` environment variables.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use vr_02_vote_protocol::ConnectionSettings;
use vr_04_vote_forwarding::{DrainSchedule, ForwardingConfig, ServerFilter, DEFAULT_DUMP_RATE};

/// Smallest accepted RSA modulus.
pub const MIN_KEY_BITS: usize = 1024;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("dump rate must be at least 1")]
    InvalidDumpRate,

    #[error("RSA key size {0} is below the minimum of 1024 bits")]
    KeyTooSmall(usize),

    #[error("read timeout must be greater than zero")]
    ZeroReadTimeout,

    #[error("cache is enabled but no cache file is configured")]
    MissingCachePath,

    #[error("invalid value '{value}' for {var}")]
    InvalidValue { var: &'static str, value: String },
}

/// Complete relay configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Protocol and key configuration.
    pub protocol: ProtocolConfig,
    /// Forwarding configuration.
    pub forwarding: ForwardingSettings,
    /// Vote cache configuration.
    pub cache: CacheConfig,
}

/// Protocol and key configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Directory holding `public.key` and `private.key`.
    pub key_dir: PathBuf,
    /// Modulus size for a newly generated key pair.
    pub key_bits: usize,
    /// Token text per service name. `default` applies to unlisted services.
    pub tokens: BTreeMap<String, String>,
    /// Longest wait for the next bytes of a frame, in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            key_dir: PathBuf::from("./rsa"),
            key_bits: shared_crypto::DEFAULT_KEY_BITS,
            tokens: BTreeMap::new(),
            read_timeout_ms: 5_000,
        }
    }
}

/// Server list with its mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerFilterConfig {
    pub servers: Vec<String>,
    /// Allow only the listed servers instead of excluding them.
    pub whitelist: bool,
}

/// Forwarding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForwardingSettings {
    /// Maximum votes per replay chunk.
    pub dump_rate: usize,
    /// `None` forwards to every server.
    pub server_filter: Option<ServerFilterConfig>,
    /// Wait before the first replay chunk, in milliseconds.
    pub initial_delay_ms: u64,
    /// Wait before each following replay chunk, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for ForwardingSettings {
    fn default() -> Self {
        let schedule = DrainSchedule::default();
        Self {
            dump_rate: DEFAULT_DUMP_RATE,
            server_filter: None,
            initial_delay_ms: schedule.initial_delay.as_millis() as u64,
            retry_delay_ms: schedule.retry_delay.as_millis() as u64,
        }
    }
}

/// Vote cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Hold undeliverable votes. Without a cache they are lost.
    pub enabled: bool,
    /// File the cache is saved to at shutdown.
    pub file_path: Option<PathBuf>,
    /// Cached votes older than this are dropped when the cache is loaded.
    pub ttl_days: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file_path: Some(PathBuf::from("./cached-votes.json")),
            ttl_days: 10,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days.saturating_mul(24 * 60 * 60))
    }
}

impl RelayConfig {
    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VR_KEY_DIR`: key directory (default: ./rsa)
    /// - `VR_KEY_BITS`: size of a generated key pair (default: 2048)
    /// - `VR_TOKENS`: `service=token` pairs separated by commas
    /// - `VR_READ_TIMEOUT_MS`: frame read timeout (default: 5000)
    /// - `VR_DUMP_RATE`: votes per replay chunk (default: 5)
    /// - `VR_SERVER_FILTER`: server names separated by commas
    /// - `VR_SERVER_FILTER_MODE`: `whitelist` or `blacklist` (default: blacklist)
    /// - `VR_CACHE_ENABLED`: hold undeliverable votes (default: true)
    /// - `VR_CACHE_FILE`: cache file path (default: ./cached-votes.json)
    /// - `VR_CACHE_TTL_DAYS`: cached vote lifetime (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(dir) = lookup("VR_KEY_DIR") {
            config.protocol.key_dir = PathBuf::from(dir);
        }
        if let Some(bits) = parse_var(&lookup, "VR_KEY_BITS")? {
            config.protocol.key_bits = bits;
        }
        if let Some(tokens) = lookup("VR_TOKENS") {
            config.protocol.tokens = parse_tokens(&tokens)?;
        }
        if let Some(ms) = parse_var(&lookup, "VR_READ_TIMEOUT_MS")? {
            config.protocol.read_timeout_ms = ms;
        }

        if let Some(rate) = parse_var(&lookup, "VR_DUMP_RATE")? {
            config.forwarding.dump_rate = rate;
        }
        if let Some(servers) = lookup("VR_SERVER_FILTER") {
            let whitelist = match lookup("VR_SERVER_FILTER_MODE").as_deref() {
                None | Some("blacklist") => false,
                Some("whitelist") => true,
                Some(other) => {
                    return Err(ConfigError::InvalidValue {
                        var: "VR_SERVER_FILTER_MODE",
                        value: other.to_string(),
                    })
                }
            };
            config.forwarding.server_filter = Some(ServerFilterConfig {
                servers: split_list(&servers),
                whitelist,
            });
        }

        if let Some(enabled) = lookup("VR_CACHE_ENABLED") {
            config.cache.enabled = parse_bool("VR_CACHE_ENABLED", &enabled)?;
        }
        if let Some(path) = lookup("VR_CACHE_FILE") {
            config.cache.file_path = Some(PathBuf::from(path)).filter(|p| !p.as_os_str().is_empty());
        }
        if let Some(days) = parse_var(&lookup, "VR_CACHE_TTL_DAYS")? {
            config.cache.ttl_days = days;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forwarding.dump_rate == 0 {
            return Err(ConfigError::InvalidDumpRate);
        }
        if self.protocol.key_bits < MIN_KEY_BITS {
            return Err(ConfigError::KeyTooSmall(self.protocol.key_bits));
        }
        if self.protocol.read_timeout_ms == 0 {
            return Err(ConfigError::ZeroReadTimeout);
        }
        if self.cache.enabled && self.cache.file_path.is_none() {
            return Err(ConfigError::MissingCachePath);
        }
        Ok(())
    }

    /// Settings for the forwarding subsystem.
    pub fn forwarding_config(&self) -> ForwardingConfig {
        let filter = match &self.forwarding.server_filter {
            Some(list) => ServerFilter::from_list(list.servers.iter().cloned(), list.whitelist),
            None => ServerFilter::AllowAll,
        };
        ForwardingConfig {
            dump_rate: self.forwarding.dump_rate,
            filter,
            schedule: DrainSchedule {
                initial_delay: Duration::from_millis(self.forwarding.initial_delay_ms),
                retry_delay: Duration::from_millis(self.forwarding.retry_delay_ms),
            },
        }
    }

    /// Settings for the connection driver.
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            read_timeout: Duration::from_millis(self.protocol.read_timeout_ms),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var, value })
        })
        .transpose()
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_tokens(value: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    split_list(value)
        .into_iter()
        .map(|pair| match pair.split_once('=') {
            Some((name, token)) if !name.trim().is_empty() && !token.trim().is_empty() => {
                Ok((name.trim().to_string(), token.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidValue {
                var: "VR_TOKENS",
                value: pair,
            }),
        })
        .collect()
}
