//! Shared test utilities for dbup-updater

use crate::confirm::ConfirmationProvider;
use crate::download::BaselineDownloader;
use crate::error::{UpdaterError, UpdaterResult};
use async_trait::async_trait;
use dbup_core::{ConnectionInfo, DatabaseKind};
use dbup_db::{DbResult, DuckDbBackend, Row, ScriptRunner};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Script runner over an in-memory DuckDB that remembers what it ran.
pub struct RecordingRunner {
    db: Arc<DuckDbBackend>,
    applied: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::with_db(Arc::new(DuckDbBackend::in_memory().unwrap()))
    }

    pub fn with_db(db: Arc<DuckDbBackend>) -> Self {
        Self {
            db,
            applied: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Make scripts named `file_name` exit with status 1 without running
    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.fail_on = Some(file_name.to_string());
        self
    }

    pub fn db(&self) -> &DuckDbBackend {
        &self.db
    }

    pub fn shared_db(&self) -> Arc<DuckDbBackend> {
        Arc::clone(&self.db)
    }

    /// File names passed to `run_file`, in call order
    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.applied.lock().unwrap().clear();
    }
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptRunner for RecordingRunner {
    async fn run_file(&self, connection: &ConnectionInfo, path: &Path) -> DbResult<i32> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.applied.lock().unwrap().push(name.clone());
        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Ok(1);
        }
        self.db.run_file(connection, path).await
    }

    async fn run_query(
        &self,
        connection: &ConnectionInfo,
        query: &str,
    ) -> DbResult<Option<Vec<Row>>> {
        self.db.run_query(connection, query).await
    }
}

/// Confirmation provider replaying canned answers.
///
/// Runs out to "no" and no path.
#[derive(Default)]
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<bool>>,
    paths: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn new(answers: &[bool], paths: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            paths: Mutex::new(paths.iter().map(|p| p.to_string()).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Every question asked so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl ConfirmationProvider for ScriptedConfirm {
    fn confirm(&self, question: &str) -> bool {
        self.asked.lock().unwrap().push(question.to_string());
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }

    fn ask_path(&self, question: &str) -> Option<String> {
        self.asked.lock().unwrap().push(question.to_string());
        self.paths.lock().unwrap().pop_front()
    }
}

/// Downloader that writes fixed content, or always fails.
pub struct FakeDownloader {
    content: Option<String>,
    urls: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub fn serving(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            content: None,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaselineDownloader for FakeDownloader {
    async fn download(&self, url: &str, destination: &Path) -> UpdaterResult<()> {
        self.urls.lock().unwrap().push(url.to_string());
        let Some(content) = &self.content else {
            return Err(UpdaterError::DownloadFailed {
                url: url.to_string(),
                reason: "503 Service Unavailable".to_string(),
            });
        };
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(destination, content).unwrap();
        Ok(())
    }
}

/// Temporary source tree with the `sql/base` and `sql/updates` layout.
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn updates_dir(&self, kind: DatabaseKind) -> PathBuf {
        self.root().join("sql").join("updates").join(kind.slug())
    }

    pub fn archived_dir(&self, kind: DatabaseKind) -> PathBuf {
        self.updates_dir(kind).join("archived")
    }

    pub fn base_file(&self, kind: DatabaseKind) -> PathBuf {
        self.root()
            .join("sql")
            .join("base")
            .join(format!("{}_database.sql", kind.slug()))
    }

    /// Write `sql/updates/<kind>/<relative>`
    pub fn write_update(&self, kind: DatabaseKind, relative: &str, sql: &str) -> PathBuf {
        write_script(&self.updates_dir(kind), relative, sql)
    }

    /// Write `sql/updates/<kind>/archived/<relative>`
    pub fn write_archived(&self, kind: DatabaseKind, relative: &str, sql: &str) -> PathBuf {
        write_script(&self.archived_dir(kind), relative, sql)
    }

    pub fn write_base(&self, kind: DatabaseKind, sql: &str) -> PathBuf {
        let path = self.base_file(kind);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, sql).unwrap();
        path
    }

    /// Ensure the updates directory exists, even without scripts
    pub fn create_updates_dir(&self, kind: DatabaseKind) {
        std::fs::create_dir_all(self.updates_dir(kind)).unwrap();
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `dir/relative`, creating parent directories
pub fn write_script(dir: &Path, relative: &str, sql: &str) -> PathBuf {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, sql).unwrap();
    path
}
