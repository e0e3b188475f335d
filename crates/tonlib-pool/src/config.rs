//! # Pool Configuration
//!
//! Worker pool, session lifecycle and network settings.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TONLIB_WORKERS` | `10` | Worker threads (one native session each) |
//! | `TONLIB_LOAD_THRESHOLD` | `300` | Contract loads per session before it is recreated |
//! | `TONLIB_RECEIVE_TIMEOUT_MS` | `10000` | Upper bound on one receive poll |
//! | `TONLIB_EXEC_DEADLINE_MS` | `60000` | Cumulative budget for one exchange |
//! | `TONLIB_VERBOSITY` | `0` | Engine log verbosity |
//! | `TONLIB_KEYSTORE` | `ton_keystore` | Keystore directory |
//! | `TONLIB_CONFIG` | built-in testnet | Path to a global network config (JSON) |

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DurationMilliSeconds};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::SessionSettings;
use crate::domain::{
    DEFAULT_EXEC_DEADLINE, DEFAULT_LOAD_THRESHOLD, DEFAULT_RECEIVE_TIMEOUT, DEFAULT_WORKERS,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file could not be read or a directory created.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The network configuration is not valid JSON of the expected shape.
    #[error("Invalid network config: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment variable could not be parsed.
    #[error("Invalid value `{value}` for {var}")]
    Env {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// A setting is out of range.
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// One liteserver entry of the global network config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Liteserver {
    /// IPv4 address as the signed 32-bit integer the engine expects.
    /// Dotted strings and unsigned integers are accepted on input.
    #[serde(deserialize_with = "deserialize_ip")]
    pub ip: i32,
    /// TCP port.
    pub port: u16,
    /// Public key record (`pub.ed25519`).
    pub id: Value,
    /// Remaining fields, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Global network config handed to the engine at `init`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Liteservers to connect to.
    pub liteservers: Vec<Liteserver>,
    /// Validator section (zero state, hardforks), opaque here.
    #[serde(default)]
    pub validator: Value,
    /// Remaining fields, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NetworkConfig {
    /// Built-in testnet configuration.
    pub fn testnet() -> Self {
        let mut extra = Map::new();
        extra.insert("@type".to_string(), Value::from("liteserver.desc"));
        Self {
            liteservers: vec![Liteserver {
                ip: 1_137_658_550,
                port: 4924,
                id: serde_json::json!({
                    "@type": "pub.ed25519",
                    "key": "peJTw/arlRfssgTuf9BMypJzqOi7SXEqSPSWiEw2U1M="
                }),
                extra,
            }],
            validator: serde_json::json!({
                "@type": "validator.config.global",
                "zero_state": {
                    "workchain": -1,
                    "shard": i64::MIN,
                    "seqno": 0,
                    "root_hash": "F6OpKZKqvqeFp6CQmFomXNMfMj2EnaUSOXN+Mh+wVWk=",
                    "file_hash": "XplPz01CXAps5qeSWUtxcyBfdAo5zVb1N979KLSKD24="
                }
            }),
            extra: Map::new(),
        }
    }

    /// Load a global config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse a global config document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        if config.liteservers.is_empty() {
            return Err(ConfigError::Invalid("no liteservers configured".to_string()));
        }
        Ok(config)
    }

    /// JSON string embedded in the `init` request.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Worker pool configuration.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Worker threads; each owns one native session.
    pub workers: usize,

    /// Contract loads a session serves before it is recreated.
    pub load_threshold: u32,

    /// Upper bound on one receive poll.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "receive_timeout_ms")]
    pub receive_timeout: Duration,

    /// Cumulative budget for one request/response exchange.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "exec_deadline_ms")]
    pub exec_deadline: Duration,

    /// Engine log verbosity.
    pub verbosity: i32,

    /// Keystore directory.
    pub keystore: PathBuf,

    /// Network to connect to.
    pub network: NetworkConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            load_threshold: DEFAULT_LOAD_THRESHOLD,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            exec_deadline: DEFAULT_EXEC_DEADLINE,
            verbosity: 0,
            keystore: PathBuf::from("ton_keystore"),
            network: NetworkConfig::testnet(),
        }
    }
}

impl PoolConfig {
    /// Create a config for testing (small pool, short timeouts).
    pub fn for_testing() -> Self {
        Self {
            workers: 2,
            receive_timeout: Duration::from_millis(20),
            exec_deadline: Duration::from_millis(500),
            keystore: std::env::temp_dir().join("tonlib-pool-test-keystore"),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "TONLIB_WORKERS")? {
            config.workers = v;
        }
        if let Some(v) = parse_var(&lookup, "TONLIB_LOAD_THRESHOLD")? {
            config.load_threshold = v;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "TONLIB_RECEIVE_TIMEOUT_MS")? {
            config.receive_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "TONLIB_EXEC_DEADLINE_MS")? {
            config.exec_deadline = Duration::from_millis(ms);
        }
        if let Some(v) = parse_var(&lookup, "TONLIB_VERBOSITY")? {
            config.verbosity = v;
        }
        if let Some(path) = lookup("TONLIB_KEYSTORE") {
            config.keystore = PathBuf::from(path);
        }
        if let Some(path) = lookup("TONLIB_CONFIG") {
            config.network = NetworkConfig::from_file(path)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.load_threshold == 0 {
            return Err(ConfigError::Invalid(
                "load_threshold must be at least 1".to_string(),
            ));
        }
        if self.receive_timeout.is_zero() || self.exec_deadline.is_zero() {
            return Err(ConfigError::Invalid("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Create the keystore directory if it does not exist.
    pub fn ensure_keystore(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.keystore).map_err(|source| ConfigError::Io {
            path: self.keystore.clone(),
            source,
        })
    }

    /// Settings shared by every worker session.
    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        self.validate()?;
        Ok(SessionSettings {
            network_json: self.network.to_json()?,
            keystore: self.keystore.to_string_lossy().into_owned(),
            verbosity: self.verbosity,
            load_threshold: self.load_threshold,
            receive_timeout: self.receive_timeout,
            exec_deadline: self.exec_deadline,
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}

fn deserialize_ip<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IpRepr {
        Number(i64),
        Text(String),
    }

    match IpRepr::deserialize(deserializer)? {
        IpRepr::Number(n) if (i32::MIN as i64..=u32::MAX as i64).contains(&n) => Ok(n as u32 as i32),
        IpRepr::Number(n) => Err(serde::de::Error::custom(format!(
            "liteserver ip {} is out of range",
            n
        ))),
        IpRepr::Text(text) => text
            .trim()
            .parse::<Ipv4Addr>()
            .map(|ip| u32::from(ip) as i32)
            .map_err(|e| serde::de::Error::custom(format!("liteserver ip `{}`: {}", text, e))),
    }
}
