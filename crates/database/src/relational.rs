use crate::cursor::{Cursor, Handle};
use crate::driver::{Driver, DriverConnection};
use crate::error::DbError;
use crate::mysql::MySqlDriver;
use crate::query::{Fetch, QueryRequest, QueryResult, prepare_sql, select_by_key};
use crate::service::DataService;
use async_trait::async_trait;
use configuration::{Config, DatabaseSettings};
use core_types::Row;

/// The resources a caller lends to [`RelationalDataService::run_query`].
///
/// Whatever the caller lends is used but never closed. Whatever the service
/// has to create for the call is closed before the call returns.
pub enum Session<'s, 'c, C: DriverConnection> {
    /// The service opens a connection and a cursor for this call only.
    Fresh,
    /// The service opens a cursor on the caller's connection.
    Connection(&'s mut C),
    /// The service runs on the caller's cursor and its connection.
    Cursor(&'s mut Cursor<'c, C>),
}

/// A data service for relational databases.
///
/// Every call works on its own connection unless the caller supplies one,
/// so nothing is cached or pooled between calls.
pub struct RelationalDataService<D: Driver = MySqlDriver> {
    config: Config,
    driver: D,
}

/// The relational data service over MySQL.
pub type MySqlDataService = RelationalDataService<MySqlDriver>;

impl RelationalDataService<MySqlDriver> {
    pub fn new(config: Config) -> Self {
        Self::with_driver(config, MySqlDriver::default())
    }
}

impl<D: Driver> RelationalDataService<D> {
    pub fn with_driver(config: Config, driver: D) -> Self {
        Self { config, driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Opens a new connection with the given autocommit mode.
    ///
    /// Connection settings are resolved from the configuration on every call.
    /// Failures are returned as-is; there is no retry.
    pub async fn acquire_connection(&self, autocommit: bool) -> Result<D::Connection, DbError> {
        let settings = DatabaseSettings::from_config(&self.config)?;
        tracing::debug!(
            "Opening connection to {}:{} as {} (autocommit={})",
            settings.host,
            settings.port,
            settings.user,
            autocommit
        );
        self.driver.connect(&settings, autocommit).await
    }

    /// Returns a cursor on `connection`, or on a new connection (opened with
    /// `autocommit`) that the cursor owns and closes with itself.
    pub async fn acquire_cursor<'c>(
        &self,
        connection: Option<&'c mut D::Connection>,
        autocommit: bool,
    ) -> Result<Cursor<'c, D::Connection>, DbError> {
        match connection {
            Some(connection) => Ok(Cursor::on(connection)),
            None => {
                let connection = self.acquire_connection(autocommit).await?;
                Ok(Cursor::new(Handle::Owned(connection)))
            }
        }
    }

    /// Runs one statement.
    ///
    /// A connection opened by this call uses `request.commits()` as its
    /// autocommit mode. When the request commits, the transaction is also
    /// committed explicitly after the statement, and rolled back if the
    /// statement or the commit fails. Anything this call opened is closed
    /// before it returns, whether it succeeded or not.
    pub async fn run_query(
        &self,
        request: &QueryRequest,
        session: Session<'_, '_, D::Connection>,
    ) -> Result<QueryResult, DbError> {
        let cursor = match session {
            Session::Cursor(cursor) => return self.execute_on(cursor, request).await,
            Session::Connection(connection) => {
                self.acquire_cursor(Some(connection), request.commits()).await?
            }
            Session::Fresh => self.acquire_cursor(None, request.commits()).await?,
        };
        self.execute_and_release(cursor, request).await
    }

    async fn execute_and_release(
        &self,
        mut cursor: Cursor<'_, D::Connection>,
        request: &QueryRequest,
    ) -> Result<QueryResult, DbError> {
        let outcome = self.execute_on(&mut cursor, request).await;

        // A release failure is logged and never replaces the query outcome.
        if let Err(e) = cursor.close().await {
            tracing::warn!("Failed to release database resources: {}", e);
        }

        outcome
    }

    async fn execute_on(
        &self,
        cursor: &mut Cursor<'_, D::Connection>,
        request: &QueryRequest,
    ) -> Result<QueryResult, DbError> {
        match self.execute_and_commit(cursor, request).await {
            Ok(result) => Ok(result),
            Err(e) => {
                if request.commits() {
                    match cursor.connection_mut().rollback().await {
                        Ok(()) => tracing::debug!("Transaction rolled back"),
                        Err(rollback_err) => tracing::warn!("Rollback failed: {}", rollback_err),
                    }
                }
                tracing::error!("run_query failed: {}", e);
                Err(e)
            }
        }
    }

    async fn execute_and_commit(
        &self,
        cursor: &mut Cursor<'_, D::Connection>,
        request: &QueryRequest,
    ) -> Result<QueryResult, DbError> {
        let prepared = prepare_sql(request.sql());
        let params = request.parameters();
        if prepared.placeholders != params.len() {
            return Err(DbError::QueryError(format!(
                "statement has {} placeholder(s) but {} parameter(s) were given",
                prepared.placeholders,
                params.len()
            )));
        }

        tracing::debug!("run_query: {} ({} parameter(s))", prepared.text, params.len());
        let count = cursor.execute(&prepared.text, params).await?;

        let result = match request.fetch_mode() {
            Fetch::All => QueryResult::Rows(cursor.fetch_all()),
            Fetch::One => QueryResult::Rows(cursor.fetch_one().into_iter().collect()),
            Fetch::RowCount => QueryResult::Affected(count),
        };

        if request.commits() {
            cursor.connection_mut().commit().await?;
            tracing::debug!("Transaction committed");
        }

        Ok(result)
    }
}

#[async_trait]
impl<D: Driver + Default> DataService for RelationalDataService<D> {
    fn from_context(config: Config) -> Self {
        Self::with_driver(config, D::default())
    }

    fn context(&self) -> &Config {
        &self.config
    }

    async fn get_data_object(
        &self,
        database_name: &str,
        collection_name: &str,
        key_field: &str,
        key_value: &str,
    ) -> Result<Option<Row>, DbError> {
        let sql = select_by_key(database_name, collection_name, key_field)?;
        // A plain read: autocommit connection, no explicit COMMIT.
        let request = QueryRequest::new(sql)
            .bind(key_value)
            .fetch(Fetch::One)
            .commit(false);

        let cursor = self.acquire_cursor(None, true).await?;
        let result = self.execute_and_release(cursor, &request).await?;
        Ok(result.into_rows().and_then(|rows| rows.into_iter().next()))
    }
}
