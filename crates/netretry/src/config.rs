//! Configuration for retry campaigns.

use crate::entropy::EntropyBackend;
use netretry_core::error::{EntropyError, RetryError};
use netretry_core::policy::{DeadlineParams, JitterPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`Config`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable held an unusable value.
    #[error("invalid value '{value}' for {var}")]
    Env {
        /// Variable name
        var: String,
        /// Offending value
        value: String,
    },

    /// A value is out of range.
    #[error(transparent)]
    Invalid(#[from] RetryError),

    /// The configured entropy backend could not be started.
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

/// Retry configuration, read once at start-up.
///
/// ```toml
/// entropy = "drbg"
/// seed = 42
///
/// [jitter]
/// max_retry_attempts = 4
/// initial_backoff_secs = 1
/// max_backoff_secs = 128
/// max_jitter_secs = 5
///
/// [deadline]
/// base_ms = 1000
/// max_backoff_ms = 10000
/// max_attempts = 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Blocking jitter backoff policy
    pub jitter: JitterPolicy,

    /// Deadline backoff parameters
    pub deadline: DeadlineParams,

    /// Entropy backend for every campaign in the process
    pub entropy: EntropyBackend,

    /// Seed for the `drbg` backend; ignored by the others
    pub seed: Option<u64>,
}

impl Config {
    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured. Recognised
    /// variables (unset ones keep their defaults):
    /// - `NETRETRY_MAX_RETRY_ATTEMPTS`, `NETRETRY_INITIAL_BACKOFF_SECS`,
    ///   `NETRETRY_MAX_BACKOFF_SECS`, `NETRETRY_MAX_JITTER_SECS`
    /// - `NETRETRY_BASE_MS`, `NETRETRY_MAX_BACKOFF_MS`, `NETRETRY_MAX_ATTEMPTS`
    /// - `NETRETRY_ENTROPY` (`os`, `drbg`, `unsupported`), `NETRETRY_SEED`
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        // Jitter backoff
        if let Some(v) = env_value("NETRETRY_MAX_RETRY_ATTEMPTS")? {
            config.jitter.max_retry_attempts = v;
        }
        if let Some(v) = env_value("NETRETRY_INITIAL_BACKOFF_SECS")? {
            config.jitter.initial_backoff_secs = v;
        }
        if let Some(v) = env_value("NETRETRY_MAX_BACKOFF_SECS")? {
            config.jitter.max_backoff_secs = v;
        }
        if let Some(v) = env_value("NETRETRY_MAX_JITTER_SECS")? {
            config.jitter.max_jitter_secs = v;
        }

        // Deadline backoff
        if let Some(v) = env_value("NETRETRY_BASE_MS")? {
            config.deadline.base_ms = v;
        }
        if let Some(v) = env_value("NETRETRY_MAX_BACKOFF_MS")? {
            config.deadline.max_backoff_ms = v;
        }
        if let Some(v) = env_value("NETRETRY_MAX_ATTEMPTS")? {
            config.deadline.max_attempts = v;
        }

        // Entropy
        if let Some(v) = env_value("NETRETRY_ENTROPY")? {
            config.entropy = v;
        }
        if let Some(v) = env_value("NETRETRY_SEED")? {
            config.seed = Some(v);
        }

        Ok(config)
    }

    /// Merge with another configuration; values `other` changed from the
    /// defaults take precedence.
    pub fn merge(mut self, other: Config) -> Self {
        let jitter = JitterPolicy::default();
        if other.jitter.max_retry_attempts != jitter.max_retry_attempts {
            self.jitter.max_retry_attempts = other.jitter.max_retry_attempts;
        }
        if other.jitter.initial_backoff_secs != jitter.initial_backoff_secs {
            self.jitter.initial_backoff_secs = other.jitter.initial_backoff_secs;
        }
        if other.jitter.max_backoff_secs != jitter.max_backoff_secs {
            self.jitter.max_backoff_secs = other.jitter.max_backoff_secs;
        }
        if other.jitter.max_jitter_secs != jitter.max_jitter_secs {
            self.jitter.max_jitter_secs = other.jitter.max_jitter_secs;
        }

        let deadline = DeadlineParams::default();
        if other.deadline.base_ms != deadline.base_ms {
            self.deadline.base_ms = other.deadline.base_ms;
        }
        if other.deadline.max_backoff_ms != deadline.max_backoff_ms {
            self.deadline.max_backoff_ms = other.deadline.max_backoff_ms;
        }
        if other.deadline.max_attempts != deadline.max_attempts {
            self.deadline.max_attempts = other.deadline.max_attempts;
        }

        if other.entropy != EntropyBackend::default() {
            self.entropy = other.entropy;
        }
        if other.seed.is_some() {
            self.seed = other.seed;
        }

        self
    }

    /// Check both policies.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jitter.validate()?;
        self.deadline.validate()?;
        Ok(())
    }
}

#[cfg(feature = "env")]
fn env_value<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
