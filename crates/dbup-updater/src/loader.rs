//! Drives the lifecycle of every enabled database.

use crate::confirm::ConfirmationProvider;
use crate::download::BaselineDownloader;
use crate::lifecycle::{DbUpdater, UpdaterServices, UpdaterSettings};
use crate::policy::policy_for;
use dbup_core::{Config, DatabaseKind};
use dbup_db::{Database, ScriptRunner};

/// One database to load, with its backend
pub struct DatabaseTarget<'a> {
    pub kind: DatabaseKind,
    pub db: &'a dyn Database,
    pub runner: &'a dyn ScriptRunner,
}

/// Loads databases in processing order, stopping at the first failure.
pub struct DatabaseLoader<'a> {
    config: &'a Config,
    confirm: &'a dyn ConfirmationProvider,
    downloader: &'a dyn BaselineDownloader,
}

impl<'a> DatabaseLoader<'a> {
    pub fn new(
        config: &'a Config,
        confirm: &'a dyn ConfirmationProvider,
        downloader: &'a dyn BaselineDownloader,
    ) -> Self {
        Self {
            config,
            confirm,
            downloader,
        }
    }

    /// Settings the lifecycle of `kind` runs with
    pub fn settings_for(&self, kind: DatabaseKind) -> UpdaterSettings {
        UpdaterSettings {
            source_directory: self.config.source_directory.clone(),
            options: self.config.update_options(),
            automatic: self.config.allow_auto_db_update,
            baseline_url: self
                .config
                .database(kind)
                .and_then(|d| d.baseline_url.clone()),
        }
    }

    /// Updater for `target`
    pub fn updater<'t>(&'t self, target: &DatabaseTarget<'t>) -> DbUpdater<'t> {
        DbUpdater::new(
            policy_for(target.kind),
            target.db,
            UpdaterServices {
                runner: target.runner,
                confirm: self.confirm,
                downloader: self.downloader,
            },
            self.settings_for(target.kind),
        )
    }

    /// Process `targets` in [`DatabaseKind`] order; `false` after the first failure.
    pub async fn load(&self, targets: &[DatabaseTarget<'_>]) -> bool {
        let mut ordered: Vec<&DatabaseTarget<'_>> = targets.iter().collect();
        ordered.sort_by_key(|t| t.kind);

        for target in ordered {
            if !self.load_one(target).await {
                log::error!(
                    "Stopping: the {} database could not be prepared",
                    policy_for(target.kind).table_name()
                );
                return false;
            }
        }
        true
    }

    /// Create, populate and update one database.
    pub async fn load_one(&self, target: &DatabaseTarget<'_>) -> bool {
        let policy = policy_for(target.kind);
        if !policy.is_enabled(self.config.updates.enable_databases) {
            log::debug!("{} database is not enabled, skipping", policy.table_name());
            return true;
        }

        let updater = self.updater(target);
        let auto_setup = self.config.updates.auto_setup;

        if !updater.exists().await {
            if !auto_setup {
                log::error!(
                    "Database \"{}\" does not exist and updates.auto_setup is disabled",
                    target.db.connection_info().database
                );
                return false;
            }
            if !updater.create().await {
                return false;
            }
        }

        if auto_setup && !updater.populate().await {
            return false;
        }

        let updates_enabled = self
            .config
            .database(target.kind)
            .map(|d| d.updates)
            .unwrap_or(true);
        if !updates_enabled {
            log::info!(
                "{} is disabled, skipping updates of the {} database",
                policy.config_key(),
                policy.table_name()
            );
            return true;
        }
        updater.update().await
    }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
