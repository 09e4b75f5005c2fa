use core_types::UnsupportedInputPolicy;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Parameters for the calculation evaluator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSettings {
    /// What the calculators do with raw input of an unknown shape.
    #[serde(default)]
    pub unsupported_input: UnsupportedInputPolicy,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// The polling policy used when a store key is not yet visible.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Reads attempted after the initial one before giving up.
    pub max_attempts: u32,
    /// Wait before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Factor applied to the wait after every retry. Must lie in (0, 1].
    pub decay: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 500,
            decay: 0.8,
        }
    }
}

impl RetrySettings {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

/// Connection parameters for the HTTP data source.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub url: String,
    /// Extra request headers, e.g. an `Authorization` token.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/data".to_string(),
            headers: HashMap::new(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum StoreBackend {
    /// A process-local map. Results do not outlive the process.
    #[default]
    Memory,
    /// A key-value table in PostgreSQL.
    Postgres,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Required by the postgres backend. Falls back to `DATABASE_URL` when unset.
    #[serde(default)]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// The default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
