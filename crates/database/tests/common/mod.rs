//! A scripted in-memory driver that records everything the services do.

#![allow(dead_code)]

use async_trait::async_trait;
use configuration::{Config, DB_HOST, DB_PORT, DB_PW, DB_USER, DatabaseSettings};
use core_types::{Row, SqlValue};
use database::{DbError, Driver, DriverConnection, Execution};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connect { id: usize, autocommit: bool },
    Execute { id: usize, query: String, params: Vec<SqlValue> },
    Commit { id: usize },
    Rollback { id: usize },
    Close { id: usize },
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    next_id: usize,
    responses: HashMap<String, Result<Execution, String>>,
    refuse_connections: Option<String>,
    fail_commits: bool,
    last_settings: Option<DatabaseSettings>,
}

#[derive(Clone, Default)]
pub struct ScriptedDriver {
    state: Arc<Mutex<State>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `query` (as sent to the backend, with `?` placeholders) with `rows`.
    pub fn respond(&self, query: &str, rows: Vec<Row>) {
        self.state.lock().unwrap().responses.insert(
            query.to_string(),
            Ok(Execution {
                rows,
                rows_affected: 0,
            }),
        );
    }

    pub fn respond_affected(&self, query: &str, rows_affected: u64) {
        self.state.lock().unwrap().responses.insert(
            query.to_string(),
            Ok(Execution {
                rows: Vec::new(),
                rows_affected,
            }),
        );
    }

    pub fn fail_on(&self, query: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(query.to_string(), Err(message.to_string()));
    }

    pub fn refuse_connections(&self, message: &str) {
        self.state.lock().unwrap().refuse_connections = Some(message.to_string());
    }

    pub fn fail_commits(&self) {
        self.state.lock().unwrap().fail_commits = true;
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn last_settings(&self) -> Option<DatabaseSettings> {
        self.state.lock().unwrap().last_settings.clone()
    }

    /// Ids of connections that were opened and not closed.
    pub fn open_connections(&self) -> Vec<usize> {
        let events = self.events();
        events
            .iter()
            .filter_map(|event| match event {
                Event::Connect { id, .. } => Some(*id),
                _ => None,
            })
            .filter(|id| !events.contains(&Event::Close { id: *id }))
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Connect { .. }))
            .count()
    }

    /// Position of `event` in the log, if it happened.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

#[async_trait]
impl Driver for ScriptedDriver {
    type Connection = ScriptedConnection;

    async fn connect(
        &self,
        settings: &DatabaseSettings,
        autocommit: bool,
    ) -> Result<Self::Connection, DbError> {
        let mut state = self.state.lock().unwrap();
        state.last_settings = Some(settings.clone());
        if let Some(message) = &state.refuse_connections {
            return Err(DbError::ConnectionError(message.clone()));
        }
        let id = state.next_id;
        state.next_id += 1;
        state.events.push(Event::Connect { id, autocommit });
        Ok(ScriptedConnection {
            id,
            autocommit,
            state: self.state.clone(),
        })
    }
}

pub struct ScriptedConnection {
    id: usize,
    autocommit: bool,
    state: Arc<Mutex<State>>,
}

impl ScriptedConnection {
    pub fn id(&self) -> usize {
        self.id
    }
}

#[async_trait]
impl DriverConnection for ScriptedConnection {
    fn autocommit(&self) -> bool {
        self.autocommit
    }

    async fn execute(&mut self, query: &str, params: &[SqlValue]) -> Result<Execution, DbError> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Execute {
            id: self.id,
            query: query.to_string(),
            params: params.to_vec(),
        });
        match state.responses.get(query) {
            Some(Ok(execution)) => Ok(execution.clone()),
            Some(Err(message)) => Err(DbError::QueryError(message.clone())),
            None => Ok(Execution::default()),
        }
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Commit { id: self.id });
        if state.fail_commits {
            return Err(DbError::QueryError("commit refused".to_string()));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::Rollback { id: self.id });
        Ok(())
    }

    async fn close(self) -> Result<(), DbError> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::Close { id: self.id });
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config::with_environment([
        (DB_HOST, "db.test"),
        (DB_PORT, "3306"),
        (DB_USER, "tester"),
        (DB_PW, "pw"),
    ])
}

pub fn row(columns: &[(&str, SqlValue)]) -> Row {
    columns
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
