//! Create, populate and update one logical database.
//!
//! The lifecycle steps report success as `bool`: errors are logged with a
//! remediation hint and never propagated, so the loader can stop cleanly.

use crate::baseline::{BaselineResolver, BaselineState};
use crate::confirm::ConfirmationProvider;
use crate::download::BaselineDownloader;
use crate::error::{UpdaterError, UpdaterResult};
use crate::fetcher::{UpdateFetcher, UpdateSource};
use crate::ledger::SqlLedger;
use crate::plan::{build_plan, UpdatePlan};
use crate::policy::DatabasePolicy;
use dbup_core::sql_utils::quote_mysql_ident;
use dbup_core::{UpdateOptions, UpdateResult};
use dbup_db::{Database, ScriptRunner};
use std::io::Write;
use std::path::PathBuf;

/// Collaborators shared by every database of a run
#[derive(Clone, Copy)]
pub struct UpdaterServices<'a> {
    pub runner: &'a dyn ScriptRunner,
    pub confirm: &'a dyn ConfirmationProvider,
    pub downloader: &'a dyn BaselineDownloader,
}

/// Per-database settings
#[derive(Debug, Clone)]
pub struct UpdaterSettings {
    /// Directory containing the `sql/` tree
    pub source_directory: PathBuf,
    pub options: UpdateOptions,
    /// Download and apply baselines without asking
    pub automatic: bool,
    pub baseline_url: Option<String>,
}

/// Lifecycle driver for one database
pub struct DbUpdater<'a> {
    policy: &'static dyn DatabasePolicy,
    db: &'a dyn Database,
    services: UpdaterServices<'a>,
    settings: UpdaterSettings,
}

impl<'a> DbUpdater<'a> {
    pub fn new(
        policy: &'static dyn DatabasePolicy,
        db: &'a dyn Database,
        services: UpdaterServices<'a>,
        settings: UpdaterSettings,
    ) -> Self {
        Self {
            policy,
            db,
            services,
            settings,
        }
    }

    pub fn policy(&self) -> &'static dyn DatabasePolicy {
        self.policy
    }

    /// Whether the target database exists; errors are logged and read as "no"
    pub async fn exists(&self) -> bool {
        match self.db.database_exists().await {
            Ok(exists) => exists,
            Err(e) => {
                log::error!(
                    "Could not check whether database \"{}\" exists: {e}",
                    self.db.connection_info().database
                );
                false
            }
        }
    }

    /// Create the target database if it does not exist yet.
    pub async fn create(&self) -> bool {
        if self.exists().await {
            return true;
        }

        let info = self.db.connection_info();
        log::info!(
            "Database \"{}\" does not exist, automatically creating it...",
            info.database
        );

        // Removed on drop, whatever the outcome.
        let mut script = match tempfile::Builder::new()
            .prefix("create_database")
            .suffix(".sql")
            .tempfile()
        {
            Ok(file) => file,
            Err(e) => {
                log::error!("Failed to create temporary query file: {e}");
                return false;
            }
        };
        let sql = format!(
            "CREATE DATABASE {} DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci;\n",
            quote_mysql_ident(&info.database)
        );
        if let Err(e) = script.write_all(sql.as_bytes()).and_then(|()| script.flush()) {
            log::error!(
                "Failed to write temporary query file \"{}\": {e}",
                script.path().display()
            );
            return false;
        }

        let server = info.without_database();
        match self.services.runner.run_file(&server, script.path()).await {
            Ok(0) => {
                log::info!("Done.");
                true
            }
            Ok(_) | Err(_) => {
                log::error!(
                    "Failed to create database {}! Does the user have `CREATE`, `ALTER`, `DROP`, `INSERT` and `DELETE` privileges on the MySQL server?",
                    info.database
                );
                false
            }
        }
    }

    /// Apply the baseline dump if the database needs one.
    pub async fn populate(&self) -> bool {
        let name = self.policy.table_name();

        if !self.policy.always_refresh_baseline() {
            match self.db.list_tables().await {
                Ok(tables) if !tables.is_empty() => return true,
                Ok(_) => {}
                Err(e) => {
                    log::error!("Could not list the tables of the {name} database: {e}");
                    return false;
                }
            }
        }

        log::info!("Populating the {name} database...");
        let resolver = BaselineResolver {
            policy: self.policy,
            base_file: self.policy.base_file(&self.settings.source_directory),
            baseline_url: self.settings.baseline_url.as_deref(),
            automatic: self.settings.automatic,
            confirm: self.services.confirm,
            downloader: self.services.downloader,
            runner: self.services.runner,
            connection: self.db.connection_info(),
        };

        match resolver.run().await {
            BaselineState::Done { applied: Some(_) } => {
                log::info!(">> {name} database population completed!");
                true
            }
            BaselineState::Done { applied: None } => true,
            BaselineState::Failed { reason } => {
                log::error!("Populating the {name} database failed: {reason}");
                false
            }
            other => {
                log::error!("Baseline resolution for {name} stopped in state {other}");
                false
            }
        }
    }

    /// Apply pending update scripts and log a summary.
    pub async fn update(&self) -> bool {
        let name = self.policy.table_name();
        log::info!("Updating {name} database...");

        match self.run_update().await {
            Ok(result) => {
                let info = format!(
                    "Containing {} new and {} archived updates.",
                    result.recent, result.archived
                );
                if result.updated == 0 {
                    log::info!(">> {name} database is up-to-date! {info}");
                } else {
                    log::info!(
                        ">> Applied {} {}. {info}",
                        result.updated,
                        if result.updated == 1 { "query" } else { "queries" }
                    );
                }
                true
            }
            Err(e) => {
                log::error!("Updating the {name} database failed: {e}");
                log::error!("hint: {}", e.remediation());
                false
            }
        }
    }

    /// Run the update fetcher, returning its error instead of logging it.
    pub async fn run_update(&self) -> UpdaterResult<UpdateResult> {
        let source = self.update_source()?;
        let ledger = SqlLedger::open(self.db).await?;
        let fetcher = UpdateFetcher::new(
            source,
            &ledger,
            self.services.runner,
            self.db.connection_info(),
        );
        fetcher.update(&self.settings.options).await
    }

    /// Classify the update scripts without applying anything.
    ///
    /// A database without a ledger table is planned against an empty ledger
    /// and the table is not created.
    pub async fn plan(&self) -> UpdaterResult<UpdatePlan> {
        let source = self.update_source()?;
        match SqlLedger::existing(self.db).await? {
            Some(ledger) => {
                let fetcher = UpdateFetcher::new(
                    source,
                    &ledger,
                    self.services.runner,
                    self.db.connection_info(),
                );
                fetcher.plan(&self.settings.options).await
            }
            None => {
                let (updates, archived) = source.scan()?;
                Ok(build_plan(updates, archived, &[], &self.settings.options))
            }
        }
    }

    fn update_source(&self) -> UpdaterResult<UpdateSource> {
        let root = &self.settings.source_directory;
        if !root.is_dir() {
            return Err(UpdaterError::DirectoryNotFound {
                path: root.display().to_string(),
            });
        }
        Ok(UpdateSource::new(
            self.policy.updates_directory(root),
            self.policy.archived_directory(root),
        ))
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;
