//! Update fetcher: scans update directories and applies the resulting plan.

use crate::error::{UpdaterError, UpdaterResult};
use crate::ledger::UpdateLedger;
use crate::plan::{build_plan, Classification, PendingReason, UpdatePlan};
use dbup_core::{
    ConnectionInfo, CoreError, DirectoryClass, UpdateOptions, UpdateResult, UpdateScript,
};
use dbup_db::ScriptRunner;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Directories an update run reads from
#[derive(Debug, Clone)]
pub struct UpdateSource {
    /// Live updates, scanned recursively
    pub updates: PathBuf,
    /// Archived updates; may live inside `updates` and is then excluded from it
    pub archived: PathBuf,
}

impl UpdateSource {
    pub fn new(updates: impl Into<PathBuf>, archived: impl Into<PathBuf>) -> Self {
        Self {
            updates: updates.into(),
            archived: archived.into(),
        }
    }

    /// Read every live and archived script.
    ///
    /// A missing updates directory is an error, a missing archive is not.
    pub fn scan(&self) -> UpdaterResult<(Vec<UpdateScript>, Vec<UpdateScript>)> {
        if !self.updates.is_dir() {
            return Err(UpdaterError::DirectoryNotFound {
                path: self.updates.display().to_string(),
            });
        }

        let mut updates = Vec::new();
        collect_scripts(
            &self.updates,
            &self.updates,
            Some(&self.archived),
            DirectoryClass::Updates,
            &mut updates,
        )?;

        let mut archived = Vec::new();
        if self.archived.is_dir() {
            collect_scripts(
                &self.archived,
                &self.archived,
                None,
                DirectoryClass::Archived,
                &mut archived,
            )?;
        }

        Ok((updates, archived))
    }
}

fn collect_scripts(
    root: &Path,
    dir: &Path,
    exclude: Option<&Path>,
    class: DirectoryClass,
    scripts: &mut Vec<UpdateScript>,
) -> UpdaterResult<()> {
    let io_err = |e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        paths.push(entry.map_err(io_err)?.path());
    }
    paths.sort();

    for path in paths {
        if path.is_dir() {
            if exclude.is_some_and(|ex| ex == path) {
                continue;
            }
            collect_scripts(root, &path, exclude, class, scripts)?;
            continue;
        }
        if !path.extension().is_some_and(|e| e == "sql") {
            continue;
        }
        scripts.push(UpdateScript::load(root, &path, class)?);
    }
    Ok(())
}

/// First characters of a hash, for log lines
fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

/// Applies the update scripts of one database.
pub struct UpdateFetcher<'a> {
    source: UpdateSource,
    ledger: &'a dyn UpdateLedger,
    runner: &'a dyn ScriptRunner,
    connection: &'a ConnectionInfo,
}

impl<'a> UpdateFetcher<'a> {
    pub fn new(
        source: UpdateSource,
        ledger: &'a dyn UpdateLedger,
        runner: &'a dyn ScriptRunner,
        connection: &'a ConnectionInfo,
    ) -> Self {
        Self {
            source,
            ledger,
            runner,
            connection,
        }
    }

    /// Classify every script without changing anything.
    pub async fn plan(&self, options: &UpdateOptions) -> UpdaterResult<UpdatePlan> {
        let (updates, archived) = self.source.scan()?;
        let records = self.ledger.list_all().await?;
        log::debug!(
            "Scanned {} update(s) and {} archived update(s) against {} ledger record(s)",
            updates.len(),
            archived.len(),
            records.len()
        );
        Ok(build_plan(updates, archived, &records, options))
    }

    /// Plan and apply in one go.
    pub async fn update(&self, options: &UpdateOptions) -> UpdaterResult<UpdateResult> {
        let plan = self.plan(options).await?;
        self.apply(&plan, options).await
    }

    /// Apply `plan`: ledger-only changes first, then pending scripts in
    /// order, then dead-reference cleanup.
    ///
    /// Stops at the first failing script. Scripts applied before it stay
    /// recorded and no cleanup happens.
    pub async fn apply(
        &self,
        plan: &UpdatePlan,
        options: &UpdateOptions,
    ) -> UpdaterResult<UpdateResult> {
        let mut result = UpdateResult::default();

        for entry in &plan.entries {
            let script = &entry.script;
            match &entry.classification {
                Classification::Renamed { from } => {
                    log::info!(
                        "Renaming update \"{from}\" to \"{}\" '{}'.",
                        script.path,
                        short_hash(&script.hash)
                    );
                    self.ledger.rename(from, &script.path).await?;
                }
                Classification::Rehash => {
                    log::info!(
                        "Updating hash of \"{}\" to '{}'.",
                        script.path,
                        short_hash(&script.hash)
                    );
                    self.ledger.rehash(&script.path, &script.hash).await?;
                }
                Classification::ArchivedRedundant { record } => {
                    log::info!("Archiving update \"{record}\" (found as \"{}\").", script.path);
                    self.ledger.archive(record).await?;
                    result.archived += 1;
                }
                Classification::Redundant { duplicate_of } => {
                    log::debug!(
                        "Skipping \"{}\", same content as \"{duplicate_of}\"",
                        script.path
                    );
                }
                _ => {}
            }
        }

        for entry in plan.pending() {
            self.apply_script(&entry.script).await?;
            result.updated += 1;
            if !matches!(
                entry.classification,
                Classification::Pending(PendingReason::ContentChanged)
            ) {
                result.recent += 1;
            }
        }

        result.cleaned = self.clean_dead_references(plan, options).await?;
        Ok(result)
    }

    async fn apply_script(&self, script: &UpdateScript) -> UpdaterResult<()> {
        log::info!(
            "Applying update \"{}\" '{}'...",
            script.path,
            short_hash(&script.hash)
        );

        let started = Instant::now();
        let status = self
            .runner
            .run_file(self.connection, &script.location)
            .await
            .map_err(|e| UpdaterError::ScriptExecutionFailed {
                path: script.path.clone(),
                detail: e.to_string(),
            })?;
        if status != 0 {
            return Err(UpdaterError::ScriptExecutionFailed {
                path: script.path.clone(),
                detail: format!("SQL client exited with status {status}"),
            });
        }
        let elapsed = started.elapsed();

        if let Err(e) = self
            .ledger
            .record_applied(&script.path, &script.hash, elapsed)
            .await
        {
            log::error!(
                "Update \"{}\" was applied but could not be recorded; it will be applied again on the next run",
                script.path
            );
            return Err(e);
        }
        Ok(())
    }

    async fn clean_dead_references(
        &self,
        plan: &UpdatePlan,
        options: &UpdateOptions,
    ) -> UpdaterResult<usize> {
        // A negative threshold disables cleanup entirely.
        let Ok(max) = u32::try_from(options.clean_dead_ref_max_count) else {
            return Ok(0);
        };

        for path in &plan.recovered_references {
            self.ledger.clear_missing(path).await?;
        }

        let mut cleaned = 0;
        for dead in &plan.dead_references {
            let missing = self.ledger.mark_missing(&dead.path).await?;
            if missing > max {
                log::info!(
                    "Deleting orphaned entry \"{}\" (missing for {missing} runs)...",
                    dead.path
                );
                self.ledger.remove(&dead.path).await?;
                cleaned += 1;
            } else {
                log::warn!(
                    "Update \"{}\" is applied but its file is missing ({missing}/{max})",
                    dead.path
                );
            }
        }
        Ok(cleaned)
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
