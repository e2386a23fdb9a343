use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;

// Declare the modules that make up this crate.
#[cfg(feature = "clap")]
pub mod cli;
pub mod database;
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use cli::DatabaseArgs;
pub use database::{DB_HOST, DB_PORT, DB_PW, DB_USER, DatabaseSettings};
pub use settings::{Config, Environment};

/// Name (without extension) of the optional override file in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dataservice";

/// Loads the application configuration.
///
/// The environment tier is the process environment (after `.env` is loaded).
/// If a `dataservice.toml` exists in the working directory, each of its
/// top-level keys becomes an override.
pub fn load_config() -> Result<Config, ConfigError> {
    let overrides =
        read_overrides(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))?;
    Ok(with_overrides(Config::from_env(), overrides))
}

/// Like [`load_config`], but reads overrides from `path`, which must exist.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let overrides = read_overrides(config::File::from(path).required(true))?;
    tracing::debug!("Loaded {} configuration override(s) from {}", overrides.len(), path.display());
    Ok(with_overrides(Config::from_env(), overrides))
}

fn read_overrides(
    source: config::File<config::FileSourceFile, config::FileFormat>,
) -> Result<HashMap<String, String>, ConfigError> {
    let builder = config::Config::builder().add_source(source).build()?;

    // Scalars of any type deserialize into their string form.
    let values = builder.try_deserialize::<HashMap<String, String>>()?;

    // Configuration names are environment-variable style, so keys are matched upper-case.
    Ok(values
        .into_iter()
        .map(|(key, value)| (key.to_ascii_uppercase(), value))
        .collect())
}

fn with_overrides(mut config: Config, overrides: HashMap<String, String>) -> Config {
    for (key, value) in overrides {
        config.set_config(key, value);
    }
    config
}
