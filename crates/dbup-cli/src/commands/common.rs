//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use dbup_core::{Config, DatabaseKind, DbType};
use dbup_db::{Database, DuckDbBackend, MysqlClient, ScriptRunner};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: this is control flow, main.rs maps it to the process status
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load dbup.yml from `--config` or the project directory.
///
/// A relative `source_directory` is resolved against the directory holding
/// the config file.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let (mut config, base) = match &global.config {
        Some(path) => {
            let path = Path::new(path);
            let config = Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (config, base)
        }
        None => {
            let dir = PathBuf::from(&global.project_dir);
            let config = Config::load_from_dir(&dir)
                .with_context(|| format!("Failed to load dbup.yml from {}", dir.display()))?;
            (config, dir)
        }
    };
    if config.source_directory.is_relative() {
        config.source_directory = base.join(&config.source_directory);
    }
    Ok(config)
}

/// The kinds a command operates on.
///
/// Without an explicit selection this is every configured kind enabled by
/// `updates.enable_databases`. An explicit selection must be configured.
pub(crate) fn select_databases(
    config: &Config,
    requested: &[DatabaseKind],
) -> Result<Vec<DatabaseKind>> {
    if requested.is_empty() {
        return Ok(config.enabled_databases());
    }

    let mut kinds = requested.to_vec();
    kinds.sort();
    kinds.dedup();
    for kind in &kinds {
        if config.database(*kind).is_none() {
            anyhow::bail!("No databases.{kind} section is configured");
        }
    }
    Ok(kinds)
}

/// Concrete backend for one configured database
pub(crate) enum Backend {
    MySql(MysqlClient),
    DuckDb(DuckDbBackend),
}

impl Backend {
    /// Connect to the backend configured for `kind`.
    pub(crate) fn connect(config: &Config, kind: DatabaseKind) -> Result<Self> {
        let database = config
            .database(kind)
            .with_context(|| format!("No databases.{kind} section is configured"))?;
        let info = config.connection_info(kind)?;

        match database.db_type {
            DbType::MySql => {
                let client = MysqlClient::locate(config.mysql_executable.as_deref(), info)
                    .with_context(|| format!("Cannot run updates for the {kind} database"))?;
                Ok(Backend::MySql(client))
            }
            DbType::DuckDb => {
                let backend = DuckDbBackend::new(&database.connection)
                    .with_context(|| format!("Failed to open {}", database.connection))?;
                Ok(Backend::DuckDb(backend))
            }
        }
    }

    pub(crate) fn db(&self) -> &dyn Database {
        match self {
            Backend::MySql(client) => client,
            Backend::DuckDb(backend) => backend,
        }
    }

    pub(crate) fn runner(&self) -> &dyn ScriptRunner {
        match self {
            Backend::MySql(client) => client,
            Backend::DuckDb(backend) => backend,
        }
    }
}

/// Connect every kind in `kinds`, in order.
pub(crate) fn connect_all(
    config: &Config,
    kinds: &[DatabaseKind],
) -> Result<Vec<(DatabaseKind, Backend)>> {
    kinds
        .iter()
        .map(|&kind| Backend::connect(config, kind).map(|backend| (kind, backend)))
        .collect()
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
