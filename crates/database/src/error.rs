use configuration::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection settings are incomplete: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to connect to the database: {0}")]
    ConnectionError(String),

    #[error("Query execution failed: {0}")]
    QueryError(String),

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),
}
