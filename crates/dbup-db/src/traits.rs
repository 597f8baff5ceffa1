//! Database and script runner trait definitions

use crate::error::DbResult;
use async_trait::async_trait;
use dbup_core::ConnectionInfo;
use std::path::Path;

/// One result row, every column rendered as text
pub type Row = Vec<String>;

/// Query/execute access to one target database (the connection "pool").
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a single statement
    async fn execute(&self, sql: &str) -> DbResult<()>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and return all rows as text
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>>;

    /// Whether the target database exists on the server
    async fn database_exists(&self) -> DbResult<bool>;

    /// Names of the tables in the target database
    async fn list_tables(&self) -> DbResult<Vec<String>>;

    /// Connection parameters of the target database
    fn connection_info(&self) -> &ConnectionInfo;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Executes SQL script files and ad-hoc queries against a connection.
///
/// This is the process boundary: the MySQL implementation spawns the command
/// line client. Script files are applied inside `BEGIN ... COMMIT`.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Apply the script at `path`; returns the exit status (0 = success).
    ///
    /// `Err` is reserved for failures to start the execution at all.
    async fn run_file(&self, connection: &ConnectionInfo, path: &Path) -> DbResult<i32>;

    /// Run `query`; `None` when it produced no rows.
    async fn run_query(&self, connection: &ConnectionInfo, query: &str)
        -> DbResult<Option<Vec<Row>>>;
}
