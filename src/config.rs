//! Console configuration.
//!
//! Defaults are overridden first by `TRISHUL_*` environment variables and
//! then by CLI flags (see [`crate::cli`]).
//!
//! # Example
//!
//! ```ignore
//! use trishul_link::config::ConsoleConfig;
//!
//! let config = ConsoleConfig::default()
//!     .with_host("snmp-lab:8000")
//!     .with_secure(true)
//!     .with_token("abc");
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "localhost:8000";
pub const CHANNEL_PATH: &str = "/api/ws";
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(30_000);
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const BACKOFF_BASE: Duration = Duration::from_millis(1_000);
pub const BACKOFF_CEILING: Duration = Duration::from_millis(30_000);

pub const ENV_HOST: &str = "TRISHUL_HOST";
pub const ENV_SECURE: &str = "TRISHUL_SECURE";
pub const ENV_TOKEN: &str = "TRISHUL_TOKEN";
pub const ENV_DATA_DIR: &str = "TRISHUL_DATA_DIR";

/// Where the channel lives and how the session paces itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// `host[:port]` of the console backend
    pub host: String,
    /// Use `wss://` / `https://` (the console is served over a secure origin)
    pub secure: bool,
    pub heartbeat_interval: Duration,
    pub probe_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_ceiling: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            secure: false,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            probe_timeout: PROBE_TIMEOUT,
            backoff_base: BACKOFF_BASE,
            backoff_ceiling: BACKOFF_CEILING,
        }
    }
}

impl TransportConfig {
    /// Channel URL for `token`.
    pub fn channel_url(&self, token: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!(
            "{}://{}{}?token={}",
            scheme,
            self.host,
            CHANNEL_PATH,
            urlencoding::encode(token)
        )
    }

    /// Base URL for REST re-seed calls.
    pub fn api_base(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }
}

/// Top-level console configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub transport: TransportConfig,
    /// Credential to connect with at startup; absent means start offline
    pub token: Option<String>,
    /// Override for the durable storage directory
    pub data_dir: Option<PathBuf>,
    /// Location to navigate to at startup
    pub route: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            token: None,
            data_dir: None,
            route: String::new(),
        }
    }
}

impl ConsoleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.transport.host = host.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.transport.secure = secure;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Defaults overlaid with the `TRISHUL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config = config.with_host(host);
        }
        if let Some(secure) = lookup(ENV_SECURE) {
            config = config.with_secure(parse_bool(ENV_SECURE, &secure)?);
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.is_empty()) {
            config = config.with_token(token);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.is_empty()) {
            config = config.with_data_dir(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_host(&self.transport.host)
    }
}

/// Accept `host` or `host:port`, nothing with a scheme or path.
pub fn validate_host(host: &str) -> Result<(), ConfigError> {
    let invalid = host.is_empty()
        || host.contains("://")
        || host.contains('/')
        || host.chars().any(char::is_whitespace);
    if invalid {
        return Err(ConfigError::InvalidHost(host.to_string()));
    }
    if let Some((_, port)) = host.rsplit_once(':') {
        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidHost(host.to_string()));
        }
    }
    Ok(())
}

pub fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
