//! Connection parameters for a target database

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Transport security requested for the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Plain connection
    #[default]
    Disabled,
    /// TLS is required
    Required,
}

/// Connection parameters for one logical database.
///
/// Parsed from `host;port_or_socket;user;password;database[;ssl]`. The
/// password is never included in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port_or_socket: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub tls: TlsMode,
}

impl ConnectionInfo {
    /// Parse a semicolon-separated connection string.
    ///
    /// `label` names the database in error messages.
    pub fn parse(label: &str, value: &str) -> CoreResult<Self> {
        let parts: Vec<&str> = value.split(';').collect();
        if parts.len() < 5 || parts.len() > 6 {
            return Err(CoreError::InvalidConnectionString {
                database: label.to_string(),
                reason: format!(
                    "expected 'host;port_or_socket;user;password;database[;ssl]', got {} fields",
                    parts.len()
                ),
            });
        }

        let tls = match parts.get(5).map(|s| s.trim()) {
            None | Some("") => TlsMode::Disabled,
            Some("ssl") => TlsMode::Required,
            Some(other) => {
                return Err(CoreError::InvalidConnectionString {
                    database: label.to_string(),
                    reason: format!("unknown TLS option '{other}' (only 'ssl' is supported)"),
                })
            }
        };

        let info = Self {
            host: parts[0].trim().to_string(),
            port_or_socket: parts[1].trim().to_string(),
            user: parts[2].trim().to_string(),
            password: parts[3].to_string(),
            database: parts[4].trim().to_string(),
            tls,
        };

        if info.host.is_empty() || info.port_or_socket.is_empty() {
            return Err(CoreError::InvalidConnectionString {
                database: label.to_string(),
                reason: "host and port_or_socket must not be empty".to_string(),
            });
        }
        if info.database.is_empty() {
            return Err(CoreError::InvalidConnectionString {
                database: label.to_string(),
                reason: "database name must not be empty".to_string(),
            });
        }

        Ok(info)
    }

    /// Connection info for an embedded database file.
    ///
    /// The file path doubles as the database name; there is no server.
    pub fn embedded(path: &str) -> Self {
        Self {
            host: "localhost".to_string(),
            port_or_socket: path.to_string(),
            user: String::new(),
            password: String::new(),
            database: path.to_string(),
            tls: TlsMode::Disabled,
        }
    }

    /// True when `port_or_socket` names a unix socket rather than a TCP port
    pub fn uses_socket(&self) -> bool {
        !self
            .port_or_socket
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    }

    /// Copy of this connection without a default database.
    ///
    /// Used to run `CREATE DATABASE` before the database exists.
    pub fn without_database(&self) -> Self {
        Self {
            database: String::new(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("host", &self.host)
            .field("port_or_socket", &self.port_or_socket)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("tls", &self.tls)
            .finish()
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}/{}",
            self.user, self.host, self.port_or_socket, self.database
        )
    }
}

#[cfg(test)]
#[path = "connection_info_test.rs"]
mod tests;
