//! Update script and ledger record types shared by the updater and the CLI

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};

/// Bookkeeping state of a ledger record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateState {
    /// Applied from the live updates directory
    Active,
    /// The file now lives in the archived directory
    Archived,
}

impl UpdateState {
    /// Value stored in the ledger's `state` column
    pub fn as_sql_str(self) -> &'static str {
        match self {
            UpdateState::Active => "RELEASED",
            UpdateState::Archived => "ARCHIVED",
        }
    }

    /// Parse the ledger's `state` column
    pub fn from_sql_str(s: &str) -> Option<Self> {
        match s {
            "RELEASED" => Some(UpdateState::Active),
            "ARCHIVED" => Some(UpdateState::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateState::Active => write!(f, "active"),
            UpdateState::Archived => write!(f, "archived"),
        }
    }
}

/// One applied update script as persisted in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRecord {
    /// Script path relative to its source directory
    pub path: String,

    /// Content checksum at the time of application (may be empty for
    /// records imported from older bookkeeping)
    pub hash: String,

    /// When the script was applied
    pub applied_at: DateTime<Utc>,

    /// Execution time in milliseconds
    pub speed_ms: u64,

    /// Active or archived
    pub state: UpdateState,

    /// Consecutive runs in which the file was not found on disk
    pub missing_runs: u32,
}

/// Which kind of directory a script was discovered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryClass {
    /// Baseline schema dump
    Base,
    /// Live updates directory
    Updates,
    /// Archived updates directory
    Archived,
}

impl fmt::Display for DirectoryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryClass::Base => write!(f, "base"),
            DirectoryClass::Updates => write!(f, "updates"),
            DirectoryClass::Archived => write!(f, "archived"),
        }
    }
}

/// An update script read from disk during one run
#[derive(Debug, Clone)]
pub struct UpdateScript {
    /// Path relative to the scanned root, `/`-separated
    pub path: String,

    /// Checksum of the file bytes at scan time
    pub hash: String,

    /// Absolute location on disk
    pub location: PathBuf,

    /// Directory the script was found in
    pub directory_class: DirectoryClass,
}

impl UpdateScript {
    /// Read and hash `file`, naming it relative to `root`.
    pub fn load(root: &Path, file: &Path, directory_class: DirectoryClass) -> CoreResult<Self> {
        let content = std::fs::read(file).map_err(|e| CoreError::IoWithPath {
            path: file.display().to_string(),
            source: e,
        })?;
        let relative = file.strip_prefix(root).unwrap_or(file);
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Ok(Self {
            path,
            hash: compute_checksum(&content),
            location: file.to_path_buf(),
            directory_class,
        })
    }
}

/// Behavior switches of one update run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Skip pending files whose content duplicates another file
    pub redundancy: bool,

    /// Re-associate ledger records with renamed files instead of re-running them
    pub allow_rehash: bool,

    /// Mark ledger records archived when their file shows up in the archive
    pub archived_redundancy: bool,

    /// Runs a record may stay missing before it is removed; negative disables cleanup
    pub clean_dead_ref_max_count: i32,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            redundancy: true,
            allow_rehash: true,
            archived_redundancy: false,
            clean_dead_ref_max_count: 3,
        }
    }
}

/// Summary of one update run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    /// Scripts executed this run
    pub updated: usize,

    /// Executed scripts that had no previous ledger record
    pub recent: usize,

    /// Records moved to the archived state this run
    pub archived: usize,

    /// Dead ledger records removed this run
    pub cleaned: usize,
}

#[cfg(test)]
#[path = "update_test.rs"]
mod tests;
