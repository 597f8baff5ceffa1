//! Error types for dbup-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// SQL client executable not found (D003)
    #[error("[D003] Didn't find any executable MySQL binary at '{searched}' or in PATH; set `mysql_executable` in dbup.yml")]
    MissingExecutable { searched: String },

    /// Failed to spawn or wait for the SQL client process (D004)
    #[error("[D004] Failed to run SQL client '{program}': {source}")]
    ProcessError {
        program: String,
        source: std::io::Error,
    },

    /// Failed to read a script file (D005)
    #[error("[D005] Failed to read script '{path}': {source}")]
    ScriptRead {
        path: String,
        source: std::io::Error,
    },

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
