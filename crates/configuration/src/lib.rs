use crate::error::ConfigError;
use crate::settings::Config;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    EngineSettings, LoggingSettings, RetrySettings, SourceSettings, StoreBackend, StoreSettings,
};

/// The file looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tally.toml";

/// Loads the application configuration.
///
/// Sources are layered in order: built-in defaults, the TOML file (optional when
/// `path` is `None`), then `TALLY__SECTION__KEY` environment variables. The
/// result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("TALLY")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Switches the store backend, e.g. from a command-line flag, and validates the
/// result again.
pub fn override_store_backend(mut config: Config, backend: StoreBackend) -> Result<Config, ConfigError> {
    config.store.backend = backend;
    validate(&config)?;
    Ok(config)
}

/// Checks the invariants the deserializer cannot express.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let decay = config.engine.retry.decay;
    if !(decay > 0.0 && decay <= 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "engine.retry.decay must lie in (0, 1], got {decay}"
        )));
    }

    if config.source.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "source.timeout_secs must be greater than zero".to_string(),
        ));
    }

    if config.store.backend == StoreBackend::Postgres
        && config.store.database_url.is_none()
        && std::env::var("DATABASE_URL").is_err()
    {
        return Err(ConfigError::ValidationError(
            "the postgres store requires store.database_url or DATABASE_URL".to_string(),
        ));
    }

    Ok(())
}
