//! Classification of on-disk update scripts against the ledger.
//!
//! [`build_plan`] is pure: it takes the scanned scripts and the current
//! ledger records and decides what an update run would do, without touching
//! the database or the filesystem. The fetcher executes the result.

use dbup_core::{DirectoryClass, UpdateOptions, UpdateRecord, UpdateScript, UpdateState};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Why a script has to be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingReason {
    /// Never applied before
    New,
    /// Applied before under the same path with different content
    ContentChanged,
    /// Same content as an applied script that was renamed, but rehashing is off
    RenameNotAllowed,
    /// Same content as another applied script still on disk, redundancy is off
    Duplicate,
}

/// Decision for one scanned file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Execute and record
    Pending(PendingReason),
    /// Already applied with identical content
    Applied,
    /// Applied under another path that no longer exists; move the record
    Renamed { from: String },
    /// Recorded without a hash; fill it in without executing
    Rehash,
    /// Content duplicates another script; skipped
    Redundant { duplicate_of: String },
    /// Archived copy of an active record; the record becomes archived
    ArchivedRedundant { record: String },
    /// Archived file, nothing to do
    Archived,
}

impl Classification {
    /// Whether the file is executed by the run
    pub fn is_pending(&self) -> bool {
        matches!(self, Classification::Pending(_))
    }

    /// Short machine-friendly label
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Pending(PendingReason::New) => "new",
            Classification::Pending(PendingReason::ContentChanged) => "changed",
            Classification::Pending(PendingReason::RenameNotAllowed) => "rename-rerun",
            Classification::Pending(PendingReason::Duplicate) => "duplicate-rerun",
            Classification::Applied => "applied",
            Classification::Renamed { .. } => "renamed",
            Classification::Rehash => "rehash",
            Classification::Redundant { .. } => "redundant",
            Classification::ArchivedRedundant { .. } => "archived-redundant",
            Classification::Archived => "archived",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Renamed { from } => write!(f, "renamed from {from}"),
            Classification::Redundant { duplicate_of } => {
                write!(f, "redundant (duplicate of {duplicate_of})")
            }
            Classification::ArchivedRedundant { record } => {
                write!(f, "archived-redundant (archives {record})")
            }
            other => f.write_str(other.label()),
        }
    }
}

/// A scanned script with its decision
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub script: UpdateScript,
    pub classification: Classification,
}

/// Ledger record that no scanned file accounts for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadReference {
    pub path: String,
    /// Missing-run counter before this run
    pub missing_runs: u32,
}

/// What an update run will do
#[derive(Debug, Clone, Default)]
pub struct UpdatePlan {
    /// Update scripts in ascending path order, followed by archived scripts
    pub entries: Vec<PlannedFile>,

    /// Records whose file is gone
    pub dead_references: Vec<DeadReference>,

    /// Records that were missing before and are present again
    pub recovered_references: Vec<String>,
}

impl UpdatePlan {
    /// Scripts to execute, in execution order
    pub fn pending(&self) -> impl Iterator<Item = &PlannedFile> {
        self.entries.iter().filter(|e| e.classification.is_pending())
    }

    /// Number of entries matching `label`
    pub fn count(&self, label: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.classification.label() == label)
            .count()
    }

    /// True when the run would neither execute nor change anything
    pub fn is_noop(&self) -> bool {
        self.entries.iter().all(|e| {
            matches!(
                e.classification,
                Classification::Applied
                    | Classification::Archived
                    | Classification::Redundant { .. }
            )
        }) && self.dead_references.is_empty()
            && self.recovered_references.is_empty()
    }
}

/// Classify `updates` and `archived` against the ledger `records`.
pub fn build_plan(
    mut updates: Vec<UpdateScript>,
    mut archived: Vec<UpdateScript>,
    records: &[UpdateRecord],
    options: &UpdateOptions,
) -> UpdatePlan {
    updates.sort_by(|a, b| a.path.cmp(&b.path));
    archived.sort_by(|a, b| a.path.cmp(&b.path));

    let by_path: HashMap<&str, &UpdateRecord> =
        records.iter().map(|r| (r.path.as_str(), r)).collect();
    // Owned so the scripts can move into their entries below
    let live: HashSet<String> = updates.iter().map(|s| s.path.clone()).collect();
    let archived_paths: HashSet<String> = archived.iter().map(|s| s.path.clone()).collect();

    // Active records per hash, in path order
    let mut active_by_hash: HashMap<&str, Vec<&UpdateRecord>> = HashMap::new();
    for record in records.iter().filter(|r| r.state == UpdateState::Active) {
        if !record.hash.is_empty() {
            active_by_hash.entry(record.hash.as_str()).or_default().push(record);
        }
    }

    // Records already taken over by a renamed or archived file
    let mut claimed: HashSet<String> = HashSet::new();
    // First pending path per hash
    let mut pending_hashes: HashMap<String, String> = HashMap::new();
    let mut entries = Vec::with_capacity(updates.len() + archived.len());

    for script in updates {
        let classification = match by_path.get(script.path.as_str()) {
            Some(record) if record.hash == script.hash => Classification::Applied,
            Some(record) if record.hash.is_empty() && options.allow_rehash => {
                Classification::Rehash
            }
            Some(_) => Classification::Pending(PendingReason::ContentChanged),
            None => classify_unrecorded(&script, &active_by_hash, &live, &claimed, options),
        };

        let classification = match classification {
            Classification::Pending(reason) if options.redundancy => {
                match pending_hashes.get(&script.hash) {
                    Some(first) => Classification::Redundant {
                        duplicate_of: first.clone(),
                    },
                    None => Classification::Pending(reason),
                }
            }
            other => other,
        };

        match &classification {
            Classification::Renamed { from } => {
                claimed.insert(from.clone());
            }
            Classification::Pending(_) => {
                pending_hashes
                    .entry(script.hash.clone())
                    .or_insert_with(|| script.path.clone());
            }
            _ => {}
        }
        entries.push(PlannedFile {
            script,
            classification,
        });
    }

    // Hashes of archived files, for recognising moved records
    let archived_hashes: HashSet<String> = archived.iter().map(|s| s.hash.clone()).collect();
    let mut archiving: HashSet<String> = HashSet::new();

    for script in archived {
        let mut classification = Classification::Archived;
        if options.archived_redundancy {
            let candidate = active_by_hash.get(script.hash.as_str()).and_then(|found| {
                found.iter().find(|r| {
                    !live.contains(r.path.as_str())
                        && !claimed.contains(&r.path)
                        && !archiving.contains(&r.path)
                })
            });
            if let Some(record) = candidate {
                archiving.insert(record.path.clone());
                classification = Classification::ArchivedRedundant {
                    record: record.path.clone(),
                };
            }
        }
        entries.push(PlannedFile {
            script,
            classification,
        });
    }

    let mut dead_references = Vec::new();
    let mut recovered_references = Vec::new();
    for record in records {
        let present = live.contains(record.path.as_str())
            || archived_paths.contains(record.path.as_str())
            || claimed.contains(&record.path)
            || archiving.contains(&record.path)
            || (record.state == UpdateState::Archived && archived_hashes.contains(&record.hash));

        if present {
            if record.missing_runs > 0 {
                recovered_references.push(record.path.clone());
            }
        } else {
            dead_references.push(DeadReference {
                path: record.path.clone(),
                missing_runs: record.missing_runs,
            });
        }
    }

    UpdatePlan {
        entries,
        dead_references,
        recovered_references,
    }
}

/// Classify a file that has no ledger record under its own path.
fn classify_unrecorded(
    script: &UpdateScript,
    active_by_hash: &HashMap<&str, Vec<&UpdateRecord>>,
    live: &HashSet<String>,
    claimed: &HashSet<String>,
    options: &UpdateOptions,
) -> Classification {
    debug_assert_eq!(script.directory_class, DirectoryClass::Updates);

    let Some(same_content) = active_by_hash.get(script.hash.as_str()) else {
        return Classification::Pending(PendingReason::New);
    };

    let moved = same_content
        .iter()
        .find(|r| !live.contains(r.path.as_str()) && !claimed.contains(&r.path));
    if let Some(record) = moved {
        return if options.allow_rehash {
            Classification::Renamed {
                from: record.path.clone(),
            }
        } else {
            Classification::Pending(PendingReason::RenameNotAllowed)
        };
    }

    match same_content.first() {
        Some(original) if options.redundancy => Classification::Redundant {
            duplicate_of: original.path.clone(),
        },
        _ => Classification::Pending(PendingReason::Duplicate),
    }
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
