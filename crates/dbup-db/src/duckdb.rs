//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Row, ScriptRunner};
use async_trait::async_trait;
use dbup_core::ConnectionInfo;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
///
/// Embedded, so the connection parameters passed to the [`ScriptRunner`]
/// methods are ignored: scripts always run against the owned connection.
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
    info: ConnectionInfo,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            info: ConnectionInfo::embedded(":memory:"),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
            info: ConnectionInfo::embedded(&path.display().to_string()),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
        Ok(())
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    /// Query rows synchronously, rendering every column as text
    fn query_rows_sync(&self, sql: &str) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
        let rows = stmt
            .query_map([], |row| {
                let col_count = row.as_ref().column_count();
                Ok((0..col_count)
                    .map(|i| get_column_as_string(row, i))
                    .collect::<Row>())
            })
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Apply `sql` inside a transaction, rolling back on error
    fn apply_in_transaction(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::ExecutionError(format!("BEGIN failed: {e}")))?;

        if let Err(e) = conn.execute_batch(sql) {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(DbError::ExecutionError(e.to_string()));
        }
        if let Err(e) = conn.execute_batch("COMMIT") {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(DbError::ExecutionError(format!("COMMIT failed: {e}")));
        }
        Ok(())
    }
}

/// Read a column value as a String, trying multiple DuckDB types.
///
/// DuckDB integer columns return `None` for `Option<String>`, so we try
/// String -> i64 -> f64 -> bool -> "NULL".
fn get_column_as_string(row: &duckdb::Row<'_>, idx: usize) -> String {
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return s;
    }
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return n.to_string();
    }
    if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
        return f.to_string();
    }
    if let Ok(Some(b)) = row.get::<_, Option<bool>>(idx) {
        return b.to_string();
    }
    "NULL".to_string()
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<()> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>> {
        self.query_rows_sync(sql)
    }

    async fn database_exists(&self) -> DbResult<bool> {
        // Opening the file creates it.
        Ok(true)
    }

    async fn list_tables(&self) -> DbResult<Vec<String>> {
        let rows = self.query_rows_sync(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        Ok(rows.into_iter().filter_map(|r| r.into_iter().next()).collect())
    }

    fn connection_info(&self) -> &ConnectionInfo {
        &self.info
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[async_trait]
impl ScriptRunner for DuckDbBackend {
    async fn run_file(&self, _connection: &ConnectionInfo, path: &Path) -> DbResult<i32> {
        let sql = match std::fs::read_to_string(path) {
            Ok(sql) => sql,
            Err(e) => {
                log::error!("Failed to read script '{}': {e}", path.display());
                return Ok(1);
            }
        };

        match self.apply_in_transaction(&sql) {
            Ok(()) => Ok(0),
            Err(e) => {
                log::error!("Applying '{}' failed: {e}", path.display());
                Ok(1)
            }
        }
    }

    async fn run_query(
        &self,
        _connection: &ConnectionInfo,
        query: &str,
    ) -> DbResult<Option<Vec<Row>>> {
        let rows = self.query_rows_sync(query)?;
        Ok(if rows.is_empty() { None } else { Some(rows) })
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
