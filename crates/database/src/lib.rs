//! # Database Crate
//!
//! Data-access services for the relational backend. Application code runs
//! parameterized statements and fetches single records through these services
//! without managing connection or cursor lifetimes at each call site.
//!
//! ## Architectural Principles
//!
//! - **Flat contract:** `DataService` is the backend-agnostic surface
//!   ("fetch one record by key"). `RelationalDataService` implements it and
//!   adds `run_query` for arbitrary statements.
//! - **Explicit ownership:** a caller may lend a connection or a cursor
//!   through `Session`. Lent resources are never closed by the service;
//!   resources the service opens for a call are always closed before the
//!   call returns.
//! - **One connection per call:** nothing is pooled or cached. Calls that must
//!   share a transaction share a connection explicitly.
//! - **Driver seam:** the services talk to a `Driver`; `MySqlDriver` is the
//!   production one, built on `sqlx`.
//!
//! ## Public API
//!
//! - `RelationalDataService` / `MySqlDataService`: `acquire_connection`,
//!   `acquire_cursor`, `run_query`, and `get_data_object` from `DataService`.
//! - `QueryRequest`, `QueryResult`, `Fetch`: what to run and what comes back.
//! - `Cursor`, `Handle`, `Session`: resource handles and their ownership.
//! - `DbError`: the errors returned from this crate.

// Declare the modules that constitute this crate.
pub mod cursor;
pub mod driver;
pub mod error;
pub mod mysql;
pub mod query;
pub mod relational;
pub mod service;

// Re-export the key components to create a clean, public-facing API.
pub use cursor::{Cursor, Handle};
pub use driver::{Driver, DriverConnection, Execution};
pub use error::DbError;
pub use mysql::{MySqlDriver, MySqlDriverConnection};
pub use query::{Fetch, QueryRequest, QueryResult};
pub use relational::{MySqlDataService, RelationalDataService, Session};
pub use service::DataService;
