//! dbup-core - Core library for dbup
//!
//! This crate provides the shared types used across all dbup components:
//! configuration parsing, connection parameters, the logical database kinds,
//! update script and ledger record types, and the content checksum.

pub mod checksum;
pub mod config;
pub mod connection_info;
pub mod database_kind;
pub mod error;
pub(crate) mod serde_helpers;
pub mod sql_utils;
pub mod update;

pub use checksum::compute_checksum;
pub use config::{Config, DatabaseConfig, DbType, UpdatesConfig};
pub use connection_info::{ConnectionInfo, TlsMode};
pub use database_kind::DatabaseKind;
pub use error::{CoreError, CoreResult};
pub use update::{
    DirectoryClass, UpdateOptions, UpdateRecord, UpdateResult, UpdateScript, UpdateState,
};
