use crate::driver::DriverConnection;
use crate::error::DbError;
use core_types::{Row, SqlValue};
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

/// A resource tagged with who is responsible for releasing it.
///
/// `Owned` resources were created by the holder and must be released by it;
/// `Borrowed` ones belong to someone else and are only used.
#[derive(Debug)]
pub enum Handle<'a, T> {
    Owned(T),
    Borrowed(&'a mut T),
}

impl<T> Handle<'_, T> {
    pub fn is_owned(&self) -> bool {
        matches!(self, Handle::Owned(_))
    }
}

impl<T> Deref for Handle<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Handle::Owned(inner) => inner,
            Handle::Borrowed(inner) => inner,
        }
    }
}

impl<T> DerefMut for Handle<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self {
            Handle::Owned(inner) => inner,
            Handle::Borrowed(inner) => inner,
        }
    }
}

/// Executes statements on exactly one connection and buffers their rows.
///
/// The cursor either owns its connection or borrows it, so it can never
/// outlive it. Closing a cursor closes the connection only if the cursor
/// owns it.
pub struct Cursor<'c, C: DriverConnection> {
    connection: Handle<'c, C>,
    buffer: VecDeque<Row>,
    rowcount: Option<u64>,
}

impl<'c, C: DriverConnection> Cursor<'c, C> {
    pub fn new(connection: Handle<'c, C>) -> Self {
        Self {
            connection,
            buffer: VecDeque::new(),
            rowcount: None,
        }
    }

    /// A cursor that borrows a connection owned by the caller.
    pub fn on(connection: &'c mut C) -> Self {
        Self::new(Handle::Borrowed(connection))
    }

    pub fn owns_connection(&self) -> bool {
        self.connection.is_owned()
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Runs `query` and replaces the buffered rows with its result set.
    ///
    /// Returns the row count: rows affected for statements, rows returned for
    /// queries.
    pub async fn execute(&mut self, query: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        self.buffer.clear();
        self.rowcount = None;

        let execution = self.connection.execute(query, params).await?;
        let count = execution.rows_affected + execution.rows.len() as u64;
        self.buffer = execution.rows.into();
        self.rowcount = Some(count);
        Ok(count)
    }

    /// Row count of the last successful `execute`, if any.
    pub fn rowcount(&self) -> Option<u64> {
        self.rowcount
    }

    pub fn fetch_one(&mut self) -> Option<Row> {
        self.buffer.pop_front()
    }

    /// Returns every row not yet fetched.
    pub fn fetch_all(&mut self) -> Vec<Row> {
        self.buffer.drain(..).collect()
    }

    /// Discards buffered rows and, when the cursor owns its connection,
    /// closes that connection.
    pub async fn close(self) -> Result<(), DbError> {
        match self.connection {
            Handle::Owned(connection) => {
                tracing::debug!("Closing cursor and the connection it owns");
                connection.close().await
            }
            Handle::Borrowed(_) => {
                tracing::debug!("Closing cursor on a borrowed connection");
                Ok(())
            }
        }
    }
}
