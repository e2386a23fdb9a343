use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Required configuration value `{0}` is not set")]
    MissingValue(String),

    #[error("Configuration value `{key}` has an invalid value: {value:?}")]
    InvalidValue { key: String, value: String },
}
