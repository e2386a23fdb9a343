use crate::driver::{Driver, DriverConnection, Execution};
use crate::error::DbError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use configuration::DatabaseSettings;
use core_types::{Row, SqlValue};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, Either, Executor, MySql, Row as _, TypeInfo, ValueRef};

/// Opens un-pooled MySQL connections with `sqlx`.
#[derive(Debug, Clone, Default)]
pub struct MySqlDriver;

#[async_trait]
impl Driver for MySqlDriver {
    type Connection = MySqlDriverConnection;

    async fn connect(
        &self,
        settings: &DatabaseSettings,
        autocommit: bool,
    ) -> Result<Self::Connection, DbError> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password);

        let mut inner = options
            .connect()
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let mode = if autocommit {
            "SET autocommit = 1"
        } else {
            "SET autocommit = 0"
        };
        if let Err(e) = inner.execute(mode).await {
            if let Err(close_err) = inner.close().await {
                tracing::warn!("Failed to close half-open connection: {}", close_err);
            }
            return Err(DbError::ConnectionError(format!(
                "could not set autocommit mode: {}",
                e
            )));
        }

        tracing::debug!("Connected to MySQL at {}:{}", settings.host, settings.port);
        Ok(MySqlDriverConnection { inner, autocommit })
    }
}

/// A single MySQL connection. Dropping it without `close` still tears down
/// the socket.
#[derive(Debug)]
pub struct MySqlDriverConnection {
    inner: MySqlConnection,
    autocommit: bool,
}

#[async_trait]
impl DriverConnection for MySqlDriverConnection {
    fn autocommit(&self) -> bool {
        self.autocommit
    }

    async fn execute(&mut self, query: &str, params: &[SqlValue]) -> Result<Execution, DbError> {
        let mut statement = sqlx::query(query);
        for param in params {
            statement = bind_value(statement, param);
        }

        let mut execution = Execution::default();
        let mut results = (&mut self.inner).fetch_many(statement);
        while let Some(step) = results.try_next().await.map_err(query_error)? {
            match step {
                Either::Left(done) => execution.rows_affected += done.rows_affected(),
                Either::Right(row) => execution.rows.push(decode_row(&row)?),
            }
        }
        Ok(execution)
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.inner.execute("COMMIT").await.map_err(query_error)?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.inner.execute("ROLLBACK").await.map_err(query_error)?;
        Ok(())
    }

    async fn close(self) -> Result<(), DbError> {
        self.inner
            .close()
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))
    }
}

fn query_error(e: sqlx::Error) -> DbError {
    DbError::QueryError(e.to_string())
}

fn bind_value<'q>(
    statement: Query<'q, MySql, MySqlArguments>,
    value: &SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => statement.bind(None::<String>),
        SqlValue::Bool(v) => statement.bind(*v),
        SqlValue::Int(v) => statement.bind(*v),
        SqlValue::UInt(v) => statement.bind(*v),
        SqlValue::Float(v) => statement.bind(*v),
        SqlValue::Text(v) => statement.bind(v.clone()),
        SqlValue::Bytes(v) => statement.bind(v.clone()),
    }
}

fn decode_row(row: &MySqlRow) -> Result<Row, DbError> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name()).map_err(|e| {
            DbError::QueryError(format!("failed to decode column `{}`: {}", column.name(), e))
        })?;
        decoded.insert(column.name(), value);
    }
    Ok(decoded)
}

/// Decodes one column by its MySQL type name.
fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Result<SqlValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(SqlValue::Null);
    }

    let value = match type_name {
        "BOOLEAN" => SqlValue::Bool(row.try_get(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => SqlValue::Int(row.try_get(index)?),
        name if name.ends_with("UNSIGNED") => SqlValue::UInt(row.try_get(index)?),
        "BIT" => SqlValue::UInt(row.try_get(index)?),
        "YEAR" => SqlValue::Int(i64::from(row.try_get::<u16, _>(index)?)),
        "FLOAT" => SqlValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        "DOUBLE" => SqlValue::Float(row.try_get(index)?),
        "DECIMAL" => SqlValue::Text(row.try_get::<Decimal, _>(index)?.to_string()),
        "DATE" => temporal(row, index, type_name, |row| {
            Ok(row.try_get::<NaiveDate, _>(index)?.to_string())
        })?,
        "TIME" => temporal(row, index, type_name, |row| {
            Ok(row.try_get::<NaiveTime, _>(index)?.to_string())
        })?,
        "DATETIME" => temporal(row, index, type_name, |row| {
            Ok(row.try_get::<NaiveDateTime, _>(index)?.to_string())
        })?,
        "TIMESTAMP" => temporal(row, index, type_name, |row| {
            Ok(row.try_get::<DateTime<Utc>, _>(index)?.to_rfc3339())
        })?,
        "JSON" => SqlValue::Text(row.try_get::<JsonValue, _>(index)?.to_string()),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
            SqlValue::Bytes(row.try_get(index)?)
        }
        // CHAR, VARCHAR, TEXT, ENUM, SET and anything newer.
        _ => text_or_bytes(row.try_get_unchecked::<Vec<u8>, _>(index)?),
    };
    Ok(value)
}

/// Decodes a temporal column with chrono, falling back to the server's own
/// values for what chrono cannot represent (zero dates, negative or
/// multi-day `TIME`).
fn temporal(
    row: &MySqlRow,
    index: usize,
    type_name: &str,
    decode: impl FnOnce(&MySqlRow) -> Result<String, sqlx::Error>,
) -> Result<SqlValue, sqlx::Error> {
    match decode(row) {
        Ok(text) => Ok(SqlValue::Text(text)),
        Err(e) => {
            let raw = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            format_binary_temporal(type_name, &raw)
                .map(SqlValue::Text)
                .ok_or(e)
        }
    }
}

/// Formats a temporal value in MySQL's binary protocol encoding (leading
/// length byte included).
fn format_binary_temporal(type_name: &str, raw: &[u8]) -> Option<String> {
    let (&len, body) = raw.split_first()?;
    if body.len() < usize::from(len) {
        return None;
    }
    let micros_at = |offset: usize| -> u32 {
        body.get(offset..offset + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .unwrap_or(0)
    };
    let fraction = |micros: u32| {
        if micros == 0 {
            String::new()
        } else {
            format!(".{:06}", micros)
        }
    };

    match type_name {
        "TIME" => {
            if len == 0 {
                return Some("00:00:00".to_string());
            }
            if len < 8 {
                return None;
            }
            let sign = if body[0] == 1 { "-" } else { "" };
            let days = u32::from_le_bytes([body[1], body[2], body[3], body[4]]);
            let hours = u64::from(days) * 24 + u64::from(body[5]);
            let micros = if len >= 12 { micros_at(8) } else { 0 };
            Some(format!(
                "{}{:02}:{:02}:{:02}{}",
                sign,
                hours,
                body[6],
                body[7],
                fraction(micros)
            ))
        }
        "DATE" | "DATETIME" | "TIMESTAMP" => {
            let (year, month, day) = if len >= 4 {
                (u16::from_le_bytes([body[0], body[1]]), body[2], body[3])
            } else {
                (0, 0, 0)
            };
            let date = format!("{:04}-{:02}-{:02}", year, month, day);
            if type_name == "DATE" {
                return Some(date);
            }
            let (hour, minute, second) = if len >= 7 {
                (body[4], body[5], body[6])
            } else {
                (0, 0, 0)
            };
            let micros = if len >= 11 { micros_at(7) } else { 0 };
            Some(format!(
                "{} {:02}:{:02}:{:02}{}",
                date,
                hour,
                minute,
                second,
                fraction(micros)
            ))
        }
        _ => None,
    }
}

/// Text when the bytes are valid UTF-8, raw bytes otherwise.
fn text_or_bytes(raw: Vec<u8>) -> SqlValue {
    match String::from_utf8(raw) {
        Ok(text) => SqlValue::Text(text),
        Err(e) => SqlValue::Bytes(e.into_bytes()),
    }
}
