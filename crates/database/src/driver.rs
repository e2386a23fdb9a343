//! The seam between the data services and a concrete database client.
//!
//! A [`Driver`] opens connections; a [`DriverConnection`] runs statements and
//! controls its transaction. The services never talk to a client library
//! directly, which keeps the resource-ownership rules testable without a
//! live server.

use crate::error::DbError;
use async_trait::async_trait;
use configuration::DatabaseSettings;
use core_types::{Row, SqlValue};

/// Everything one statement produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
    /// Rows returned by the statement, in order. Empty for statements that
    /// produce no result set.
    pub rows: Vec<Row>,
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
}

/// Opens connections to one kind of backend.
#[async_trait]
pub trait Driver: Send + Sync {
    type Connection: DriverConnection;

    /// Opens a new connection. Failures must be reported as
    /// [`DbError::ConnectionError`].
    async fn connect(
        &self,
        settings: &DatabaseSettings,
        autocommit: bool,
    ) -> Result<Self::Connection, DbError>;
}

/// A live connection with a fixed autocommit mode.
#[async_trait]
pub trait DriverConnection: Send {
    /// The autocommit mode chosen when the connection was opened.
    fn autocommit(&self) -> bool;

    /// Runs one statement with positional `?` parameters.
    async fn execute(&mut self, query: &str, params: &[SqlValue]) -> Result<Execution, DbError>;

    async fn commit(&mut self) -> Result<(), DbError>;

    async fn rollback(&mut self) -> Result<(), DbError>;

    /// Closes the connection. The connection cannot be used afterwards.
    async fn close(self) -> Result<(), DbError>
    where
        Self: Sized;
}
