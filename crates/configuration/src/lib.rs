use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config,
    AnalysisDefaults, DataSourceKind, LoggingConfig, RemoteConfig, ReportSettings, ServerConfig,
};

/// Prefix for environment overrides, e.g. `INSIGHT__REMOTE__ENABLED=true`.
pub const ENV_PREFIX: &str = "INSIGHT";

/// Loads the application configuration.
///
/// Reads the TOML file at `path` (a missing file is fine; every section has
/// defaults), layers `INSIGHT__SECTION__KEY` environment variables on top,
/// deserializes the result into our strongly-typed `Config` and validates it.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(path = %path.display(), remote = config.remote.enabled, "Configuration loaded.");
    Ok(config)
}
