//! Logical databases managed by the updater

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the logical databases of the server application.
///
/// The declaration order is the processing order used by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// Login/authentication database
    Auth,
    /// Character database
    Characters,
    /// World data database
    World,
    /// Hotfix data database
    Hotfixes,
}

impl DatabaseKind {
    /// All kinds, in processing order
    pub const ALL: [DatabaseKind; 4] = [
        DatabaseKind::Auth,
        DatabaseKind::Characters,
        DatabaseKind::World,
        DatabaseKind::Hotfixes,
    ];

    /// Bit of this kind in the `Updates.EnableDatabases` mask
    pub fn flag(self) -> u32 {
        match self {
            DatabaseKind::Auth => 1,
            DatabaseKind::Characters => 2,
            DatabaseKind::World => 4,
            DatabaseKind::Hotfixes => 8,
        }
    }

    /// Directory and config name (`auth`, `characters`, ...)
    pub fn slug(self) -> &'static str {
        match self {
            DatabaseKind::Auth => "auth",
            DatabaseKind::Characters => "characters",
            DatabaseKind::World => "world",
            DatabaseKind::Hotfixes => "hotfixes",
        }
    }

    /// Whether `mask` selects this kind
    pub fn in_mask(self, mask: u32) -> bool {
        mask & self.flag() != 0
    }

    /// Combined mask of `kinds`
    pub fn mask_of(kinds: &[DatabaseKind]) -> u32 {
        kinds.iter().fold(0, |mask, kind| mask | kind.flag())
    }
}

impl std::fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for DatabaseKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auth" | "login" => Ok(DatabaseKind::Auth),
            "characters" | "character" => Ok(DatabaseKind::Characters),
            "world" => Ok(DatabaseKind::World),
            "hotfixes" | "hotfix" => Ok(DatabaseKind::Hotfixes),
            _ => Err(CoreError::UnknownDatabase {
                name: s.to_string(),
            }),
        }
    }
}
