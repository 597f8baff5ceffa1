//! Configuration types and parsing for dbup.yml

use crate::connection_info::ConnectionInfo;
use crate::database_kind::DatabaseKind;
use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use crate::update::UpdateOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration from dbup.yml
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing the `sql/` tree (`sql/base`, `sql/updates`)
    pub source_directory: PathBuf,

    /// Path to the MySQL command line client; searched on `PATH` when unset
    #[serde(default)]
    pub mysql_executable: Option<PathBuf>,

    /// `AllowAutoDBUpdate`: download and apply baselines without prompting
    #[serde(default)]
    pub allow_auto_db_update: bool,

    /// `Updates.*` settings
    #[serde(default)]
    pub updates: UpdatesConfig,

    /// Per-database connection and update settings
    #[serde(default)]
    pub databases: BTreeMap<DatabaseKind, DatabaseConfig>,
}

/// `Updates.*` settings shared by all databases
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatesConfig {
    /// `Updates.EnableDatabases`: bitmask of databases to process
    #[serde(default = "default_enable_databases")]
    pub enable_databases: u32,

    /// `Updates.AutoSetup`: create and populate missing databases
    #[serde(default = "default_true")]
    pub auto_setup: bool,

    /// `Updates.Redundancy`
    #[serde(default = "default_true")]
    pub redundancy: bool,

    /// `Updates.AllowRehash`
    #[serde(default = "default_true")]
    pub allow_rehash: bool,

    /// `Updates.ArchivedRedundancy`
    #[serde(default)]
    pub archived_redundancy: bool,

    /// `Updates.CleanDeadRefMaxCount`
    #[serde(default = "default_clean_dead_ref_max_count")]
    pub clean_dead_ref_max_count: i32,
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            enable_databases: default_enable_databases(),
            auto_setup: true,
            redundancy: true,
            allow_rehash: true,
            archived_redundancy: false,
            clean_dead_ref_max_count: default_clean_dead_ref_max_count(),
        }
    }
}

/// Database backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL / MariaDB driven through the command line client (default)
    #[default]
    MySql,
    /// Embedded DuckDB file
    DuckDb,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::MySql => write!(f, "mysql"),
            DbType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Settings for one logical database
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Backend type (mysql or duckdb)
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// `host;port_or_socket;user;password;database[;ssl]` for MySQL, a file
    /// path for DuckDB
    pub connection: String,

    /// `Updates.<Name>`: whether incremental updates run for this database
    #[serde(default = "default_true")]
    pub updates: bool,

    /// Where to download the baseline dump from (world and hotfixes only)
    #[serde(default)]
    pub baseline_url: Option<String>,
}

const ALL_DATABASES_MASK: u32 = 0b1111;

fn default_enable_databases() -> u32 {
    ALL_DATABASES_MASK
}

fn default_clean_dead_ref_max_count() -> i32 {
    3
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {e}", path.display()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory
    /// Looks for dbup.yml or dbup.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("dbup.yml");
        let yaml_path = dir.join("dbup.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> CoreResult<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.source_directory.as_os_str().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "source_directory cannot be empty".to_string(),
            });
        }

        if self.updates.enable_databases & !ALL_DATABASES_MASK != 0 {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "updates.enable_databases = {} sets unknown bits (valid mask is 0..={})",
                    self.updates.enable_databases, ALL_DATABASES_MASK
                ),
            });
        }

        for (kind, database) in &self.databases {
            if database.db_type == DbType::MySql {
                ConnectionInfo::parse(kind.slug(), &database.connection)?;
            } else if database.connection.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("databases.{kind}.connection cannot be empty"),
                });
            }
        }

        for kind in DatabaseKind::ALL {
            if kind.in_mask(self.updates.enable_databases) && !self.databases.contains_key(&kind)
            {
                log::warn!(
                    "updates.enable_databases selects '{kind}' but no databases.{kind} section is configured; it will be skipped"
                );
            }
        }

        Ok(())
    }

    /// Update behavior switches derived from `updates`
    pub fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            redundancy: self.updates.redundancy,
            allow_rehash: self.updates.allow_rehash,
            archived_redundancy: self.updates.archived_redundancy,
            clean_dead_ref_max_count: self.updates.clean_dead_ref_max_count,
        }
    }

    /// Settings for `kind`, if configured
    pub fn database(&self, kind: DatabaseKind) -> Option<&DatabaseConfig> {
        self.databases.get(&kind)
    }

    /// Configured kinds selected by the enable mask, in processing order
    pub fn enabled_databases(&self) -> Vec<DatabaseKind> {
        DatabaseKind::ALL
            .into_iter()
            .filter(|kind| kind.in_mask(self.updates.enable_databases))
            .filter(|kind| self.databases.contains_key(kind))
            .collect()
    }

    /// Connection parameters for `kind`
    pub fn connection_info(&self, kind: DatabaseKind) -> CoreResult<ConnectionInfo> {
        let database = self.database(kind).ok_or_else(|| CoreError::ConfigInvalid {
            message: format!("no databases.{kind} section is configured"),
        })?;
        match database.db_type {
            DbType::MySql => ConnectionInfo::parse(kind.slug(), &database.connection),
            DbType::DuckDb => Ok(ConnectionInfo::embedded(&database.connection)),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
