//! Per-database policies.
//!
//! Every logical database has the same lifecycle; the policy supplies the
//! parts that differ: names, file locations and where the baseline comes from.

use dbup_core::DatabaseKind;
use std::path::{Path, PathBuf};

/// Where the baseline dump of a database comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseLocation {
    /// Shipped with the source tree
    RepositoryBundled,
    /// Downloaded on demand
    RemoteDownload,
}

/// Static description of one logical database.
pub trait DatabasePolicy: Send + Sync {
    fn kind(&self) -> DatabaseKind;

    /// Configuration key of the per-database update switch
    fn config_key(&self) -> &'static str;

    /// Human-readable name used in log lines
    fn table_name(&self) -> &'static str;

    fn base_location(&self) -> BaseLocation;

    /// Whether the baseline is applied even when the database has tables
    fn always_refresh_baseline(&self) -> bool {
        false
    }

    /// Whether `mask` selects this database
    fn is_enabled(&self, mask: u32) -> bool {
        self.kind().in_mask(mask)
    }

    /// Baseline dump; `None` when the source tree has no place for one
    fn base_file(&self, source: &Path) -> Option<PathBuf> {
        Some(
            source
                .join("sql")
                .join("base")
                .join(format!("{}_database.sql", self.kind().slug())),
        )
    }

    fn updates_directory(&self, source: &Path) -> PathBuf {
        source.join("sql").join("updates").join(self.kind().slug())
    }

    fn archived_directory(&self, source: &Path) -> PathBuf {
        self.updates_directory(source).join("archived")
    }
}

/// Login server database
pub struct AuthPolicy;

impl DatabasePolicy for AuthPolicy {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Auth
    }
    fn config_key(&self) -> &'static str {
        "Updates.Auth"
    }
    fn table_name(&self) -> &'static str {
        "Auth"
    }
    fn base_location(&self) -> BaseLocation {
        BaseLocation::RepositoryBundled
    }
}

/// Character database
pub struct CharactersPolicy;

impl DatabasePolicy for CharactersPolicy {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Characters
    }
    fn config_key(&self) -> &'static str {
        "Updates.Character"
    }
    fn table_name(&self) -> &'static str {
        "Character"
    }
    fn base_location(&self) -> BaseLocation {
        BaseLocation::RepositoryBundled
    }
}

/// World database. The full dump is released separately from the source.
pub struct WorldPolicy;

impl DatabasePolicy for WorldPolicy {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::World
    }
    fn config_key(&self) -> &'static str {
        "Updates.World"
    }
    fn table_name(&self) -> &'static str {
        "World"
    }
    fn base_location(&self) -> BaseLocation {
        BaseLocation::RemoteDownload
    }
    fn always_refresh_baseline(&self) -> bool {
        true
    }
}

/// Hotfix database, released together with the world dump.
pub struct HotfixesPolicy;

impl DatabasePolicy for HotfixesPolicy {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Hotfixes
    }
    fn config_key(&self) -> &'static str {
        "Updates.Hotfix"
    }
    fn table_name(&self) -> &'static str {
        "Hotfixes"
    }
    fn base_location(&self) -> BaseLocation {
        BaseLocation::RemoteDownload
    }
    fn always_refresh_baseline(&self) -> bool {
        true
    }
}

/// Policy registry
pub fn policy_for(kind: DatabaseKind) -> &'static dyn DatabasePolicy {
    match kind {
        DatabaseKind::Auth => &AuthPolicy,
        DatabaseKind::Characters => &CharactersPolicy,
        DatabaseKind::World => &WorldPolicy,
        DatabaseKind::Hotfixes => &HotfixesPolicy,
    }
}
