//! dbup-db - Database abstraction layer for dbup
//!
//! This crate provides the `Database` and `ScriptRunner` traits and their
//! implementations for MySQL (through the command line client) and DuckDB.

pub mod duckdb;
pub mod error;
pub mod mysql;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use mysql::{find_executable, MysqlClient};
pub use traits::{Database, Row, ScriptRunner};
