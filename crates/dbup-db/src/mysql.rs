//! MySQL backend driven through the `mysql` command line client
//!
//! Scripts are applied with `SOURCE` inside an explicit `BEGIN; ...; COMMIT;`
//! and queries run in batch mode with tab-separated output. The password is
//! handed to the child through `MYSQL_PWD`, so it never shows up in the
//! argument list (process listings) or in any log line.

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Row, ScriptRunner};
use async_trait::async_trait;
use dbup_core::sql_utils::string_literal;
use dbup_core::{ConnectionInfo, TlsMode};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Name of the client binary searched on `PATH`
const MYSQL_BINARY: &str = if cfg!(windows) { "mysql.exe" } else { "mysql" };

/// Environment variable the client reads the password from
const PASSWORD_ENV: &str = "MYSQL_PWD";

/// Resolve the MySQL client executable.
///
/// Uses `configured` when it points at a regular file, otherwise searches
/// `PATH`. The result is absolute and meant to be stored once, at startup.
pub fn find_executable(configured: Option<&Path>) -> DbResult<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()));
        }
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    if let Some(found) = search_dirs(MYSQL_BINARY, std::env::split_paths(&path_var)) {
        if configured.is_some() {
            log::warn!(
                "Configured mysql_executable not found, using '{}' from PATH",
                found.display()
            );
        }
        return Ok(found);
    }

    Err(DbError::MissingExecutable {
        searched: configured
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| MYSQL_BINARY.to_string()),
    })
}

/// First `dir/name` that is a regular file
fn search_dirs(name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Connection flags shared by every client invocation (no password).
pub(crate) fn connection_args(info: &ConnectionInfo) -> Vec<String> {
    let mut args = vec![format!("-h{}", info.host), format!("-u{}", info.user)];

    if cfg!(windows) && info.host == "." {
        args.push("--protocol=PIPE".to_string());
    } else if info.uses_socket() {
        // The host is reported as localhost with sockets, so the port flag
        // has to be neutralised explicitly.
        args.push("-P0".to_string());
        args.push("--protocol=SOCKET".to_string());
        args.push(format!("-S{}", info.port_or_socket));
    } else {
        args.push(format!("-P{}", info.port_or_socket));
    }

    args.push("--default-character-set=utf8mb4".to_string());
    args.push("--max-allowed-packet=1GB".to_string());

    if info.tls == TlsMode::Required {
        args.push("--ssl-mode=REQUIRED".to_string());
    }

    args
}

/// Arguments that apply `path` inside a transaction.
pub(crate) fn file_args(info: &ConnectionInfo, path: &Path) -> Vec<String> {
    let mut args = connection_args(info);
    args.push("-e".to_string());
    args.push(format!(
        "BEGIN; SOURCE {}; COMMIT;",
        path.display().to_string().replace('\\', "/")
    ));
    if !info.database.is_empty() {
        args.push(info.database.clone());
    }
    args
}

/// Arguments that run `query` in batch mode without column headers.
pub(crate) fn query_args(info: &ConnectionInfo, query: &str) -> Vec<String> {
    let mut args = connection_args(info);
    args.push("--batch".to_string());
    args.push("--skip-column-names".to_string());
    args.push("-e".to_string());
    args.push(query.to_string());
    if !info.database.is_empty() {
        args.push(info.database.clone());
    }
    args
}

/// Parse batch-mode output: one row per line, tab-separated columns.
pub(crate) fn parse_batch_output(stdout: &str) -> Vec<Row> {
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.split('\t').map(String::from).collect())
        .collect()
}

/// MySQL connection backed by the command line client
pub struct MysqlClient {
    executable: PathBuf,
    info: ConnectionInfo,
}

impl MysqlClient {
    /// Create a client for `info` using an already resolved executable
    pub fn new(executable: PathBuf, info: ConnectionInfo) -> Self {
        Self { executable, info }
    }

    /// Resolve the executable (see [`find_executable`]) and create a client
    pub fn locate(configured: Option<&Path>, info: ConnectionInfo) -> DbResult<Self> {
        Ok(Self::new(find_executable(configured)?, info))
    }

    /// The resolved client executable
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    async fn spawn(
        &self,
        info: &ConnectionInfo,
        args: Vec<String>,
    ) -> DbResult<std::process::Output> {
        let mut command = Command::new(&self.executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if info.password.is_empty() {
            command.env_remove(PASSWORD_ENV);
        } else {
            command.env(PASSWORD_ENV, &info.password);
        }

        command.output().await.map_err(|e| DbError::ProcessError {
            program: self.executable.display().to_string(),
            source: e,
        })
    }

    async fn query_own(&self, sql: &str) -> DbResult<Vec<Row>> {
        Ok(self.run_query(&self.info, sql).await?.unwrap_or_default())
    }
}

#[async_trait]
impl ScriptRunner for MysqlClient {
    async fn run_file(&self, connection: &ConnectionInfo, path: &Path) -> DbResult<i32> {
        let output = self.spawn(connection, file_args(connection, path)).await?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("{line}");
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            log::error!("{line}");
        }

        Ok(output.status.code().unwrap_or(-1))
    }

    async fn run_query(
        &self,
        connection: &ConnectionInfo,
        query: &str,
    ) -> DbResult<Option<Vec<Row>>> {
        let output = self.spawn(connection, query_args(connection, query)).await?;
        if !output.status.success() {
            return Err(DbError::ExecutionError(format!(
                "{} (query: {query})",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let rows = parse_batch_output(&String::from_utf8_lossy(&output.stdout));
        Ok(if rows.is_empty() { None } else { Some(rows) })
    }
}

#[async_trait]
impl Database for MysqlClient {
    async fn execute(&self, sql: &str) -> DbResult<()> {
        self.query_own(sql).await.map(|_| ())
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.query_own(sql).await.map(|_| ())
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>> {
        self.query_own(sql).await
    }

    async fn database_exists(&self) -> DbResult<bool> {
        let sql = format!(
            "SELECT SCHEMA_NAME FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = {}",
            string_literal(&self.info.database)
        );
        let rows = self
            .run_query(&self.info.without_database(), &sql)
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(rows.is_some())
    }

    async fn list_tables(&self) -> DbResult<Vec<String>> {
        let rows = self.query_own("SHOW TABLES").await?;
        Ok(rows.into_iter().filter_map(|r| r.into_iter().next()).collect())
    }

    fn connection_info(&self) -> &ConnectionInfo {
        &self.info
    }

    fn db_type(&self) -> &'static str {
        "mysql"
    }
}

#[cfg(test)]
#[path = "mysql_test.rs"]
mod tests;
