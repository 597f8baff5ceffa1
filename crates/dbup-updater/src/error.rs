//! Error types for the update engine.

use dbup_core::CoreError;
use dbup_db::DbError;
use thiserror::Error;

/// Update engine errors.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// The updates directory does not exist; no plan was produced (U001).
    #[error("[U001] Update directory not found: {path}")]
    DirectoryNotFound { path: String },

    /// A script failed; the remaining plan was aborted (U002).
    #[error("[U002] Applying update '{path}' failed: {detail}")]
    ScriptExecutionFailed { path: String, detail: String },

    /// The ledger could not be read or written (U003).
    #[error("[U003] Update ledger error ({context}): {source}")]
    PersistenceError {
        context: String,
        #[source]
        source: DbError,
    },

    /// The baseline dump could not be downloaded (U004).
    #[error("[U004] Failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The SQL client could not be located (U005).
    #[error("[U005] Didn't find any executable MySQL binary at '{searched}' or in PATH")]
    MissingExecutable { searched: String },

    /// Script discovery failed (U006).
    #[error("[U006] {0}")]
    Core(#[from] CoreError),

    /// Other database error (U007).
    #[error("[U007] {0}")]
    Db(DbError),
}

/// Result type alias for [`UpdaterError`].
pub type UpdaterResult<T> = Result<T, UpdaterError>;

impl From<DbError> for UpdaterError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::MissingExecutable { searched } => UpdaterError::MissingExecutable { searched },
            other => UpdaterError::Db(other),
        }
    }
}

impl UpdaterError {
    /// Short remediation hint logged next to the error.
    pub fn remediation(&self) -> &'static str {
        match self {
            UpdaterError::DirectoryNotFound { .. } => {
                "change `source_directory` in dbup.yml to the directory containing your sql directory"
            }
            UpdaterError::ScriptExecutionFailed { .. } => {
                "fix the failing script; updates applied before it are recorded and will not run again"
            }
            UpdaterError::PersistenceError { .. } => {
                "check the database connection; a script may have run without being recorded and could be applied again"
            }
            UpdaterError::DownloadFailed { .. } => {
                "download the baseline manually and place it at the expected base file path"
            }
            UpdaterError::MissingExecutable { .. } => {
                "install the MySQL client or set `mysql_executable` in dbup.yml"
            }
            UpdaterError::Core(_) => "check the file permissions of the updates directory",
            UpdaterError::Db(_) => "check the database connection settings",
        }
    }
}
