use crate::error::DbError;
use async_trait::async_trait;
use configuration::Config;
use core_types::Row;

/// The contract every data-access backend satisfies.
///
/// Callers that only need "fetch one record by key" can depend on this trait
/// and stay agnostic of the backend behind it.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Builds the service from the configuration it will read its
    /// connection settings from.
    fn from_context(config: Config) -> Self
    where
        Self: Sized;

    /// The configuration the service was built with.
    fn context(&self) -> &Config;

    /// Fetches the record of `database_name.collection_name` whose
    /// `key_field` equals `key_value`.
    ///
    /// Returns `Ok(None)` when no record matches. A failed lookup is an
    /// `Err`, never a silent `None`.
    async fn get_data_object(
        &self,
        database_name: &str,
        collection_name: &str,
        key_field: &str,
        key_value: &str,
    ) -> Result<Option<Row>, DbError>;
}
