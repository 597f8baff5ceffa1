//! Baseline resolution state machine.
//!
//! Decides which dump initializes a database and applies it:
//!
//! ```text
//! NeedBaseline ──► Downloading ──► Applying ──► Done
//!      │               │              ▲  │
//!      ▼               ▼              │  ▼
//! AwaitingLocalFallback ──────────────┘  Failed
//! ```

use crate::confirm::ConfirmationProvider;
use crate::download::BaselineDownloader;
use crate::policy::{BaseLocation, DatabasePolicy};
use dbup_core::ConnectionInfo;
use dbup_db::ScriptRunner;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaselineState {
    NeedBaseline,
    Downloading { url: String },
    AwaitingLocalFallback,
    Applying { file: PathBuf },
    /// `applied` is `None` when population was skipped
    Done { applied: Option<PathBuf> },
    Failed { reason: String },
}

impl BaselineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BaselineState::Done { .. } | BaselineState::Failed { .. })
    }

    pub fn can_transition_to(&self, next: &BaselineState) -> bool {
        use BaselineState::*;
        match (self, next) {
            (NeedBaseline, Downloading { .. }) => true,
            (NeedBaseline, AwaitingLocalFallback) => true,
            (NeedBaseline, Applying { .. }) => true,
            (NeedBaseline, Done { applied: None }) => true,
            (Downloading { .. }, Applying { .. }) => true,
            (AwaitingLocalFallback, Applying { .. }) => true,
            (AwaitingLocalFallback, Done { applied: None }) => true,
            (Applying { .. }, Done { applied: Some(_) }) => true,
            (state, Failed { .. }) => !state.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for BaselineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineState::NeedBaseline => write!(f, "need-baseline"),
            BaselineState::Downloading { url } => write!(f, "downloading {url}"),
            BaselineState::AwaitingLocalFallback => write!(f, "awaiting-local-fallback"),
            BaselineState::Applying { file } => write!(f, "applying {}", file.display()),
            BaselineState::Done { applied: Some(file) } => write!(f, "done ({})", file.display()),
            BaselineState::Done { applied: None } => write!(f, "done (skipped)"),
            BaselineState::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Drives [`BaselineState`] to a terminal state for one database.
pub struct BaselineResolver<'a> {
    pub(crate) policy: &'a dyn DatabasePolicy,
    /// Where the baseline dump is expected; downloads are written here
    pub(crate) base_file: Option<PathBuf>,
    pub(crate) baseline_url: Option<&'a str>,
    /// Bypass prompts, answering yes to the download
    pub(crate) automatic: bool,
    pub(crate) confirm: &'a dyn ConfirmationProvider,
    pub(crate) downloader: &'a dyn BaselineDownloader,
    pub(crate) runner: &'a dyn ScriptRunner,
    pub(crate) connection: &'a ConnectionInfo,
}

impl BaselineResolver<'_> {
    /// Run the machine from [`BaselineState::NeedBaseline`].
    pub async fn run(&self) -> BaselineState {
        let mut state = BaselineState::NeedBaseline;
        while !state.is_terminal() {
            let next = self.step(&state).await;
            if !state.can_transition_to(&next) {
                return BaselineState::Failed {
                    reason: format!("invalid baseline transition from {state} to {next}"),
                };
            }
            log::debug!("{} baseline: {state} -> {next}", self.policy.table_name());
            state = next;
        }
        state
    }

    /// Compute the successor of `state`.
    pub async fn step(&self, state: &BaselineState) -> BaselineState {
        match state {
            BaselineState::NeedBaseline => self.need_baseline(),
            BaselineState::Downloading { url } => self.downloading(url).await,
            BaselineState::AwaitingLocalFallback => self.local_fallback(),
            BaselineState::Applying { file } => self.applying(file).await,
            terminal => terminal.clone(),
        }
    }

    fn need_baseline(&self) -> BaselineState {
        let Some(base) = &self.base_file else {
            log::info!(">> No base file provided, skipped!");
            return BaselineState::Done { applied: None };
        };

        let remote_url = match self.policy.base_location() {
            BaseLocation::RemoteDownload => self.baseline_url,
            BaseLocation::RepositoryBundled => None,
        };
        let name = self.policy.table_name();

        if let Some(url) = remote_url {
            if self.automatic {
                log::info!("AllowAutoDBUpdate is set, downloading the {name} baseline without asking.");
                return BaselineState::Downloading {
                    url: url.to_string(),
                };
            }
            if self.confirm.confirm(&format!(
                "Do you want to download and apply the latest {name} database baseline?"
            )) {
                return BaselineState::Downloading {
                    url: url.to_string(),
                };
            }
            return BaselineState::AwaitingLocalFallback;
        }

        if base.is_file() {
            BaselineState::Applying { file: base.clone() }
        } else if self.automatic {
            BaselineState::Failed {
                reason: format!("base file {} does not exist", base.display()),
            }
        } else {
            BaselineState::AwaitingLocalFallback
        }
    }

    async fn downloading(&self, url: &str) -> BaselineState {
        let Some(base) = &self.base_file else {
            return BaselineState::Failed {
                reason: "no base file location to download to".to_string(),
            };
        };
        match self.downloader.download(url, base).await {
            Ok(()) => {
                log::info!("Successfully downloaded {}", base.display());
                BaselineState::Applying { file: base.clone() }
            }
            Err(e) => {
                log::error!("Failed to download {url}. Manual download required!");
                BaselineState::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn local_fallback(&self) -> BaselineState {
        if self
            .confirm
            .confirm("Do you want to use an existing local SQL file instead?")
        {
            return match self.confirm.ask_path("Enter full path to local SQL file") {
                Some(path) => {
                    let file = PathBuf::from(path);
                    if file.is_file() {
                        log::info!("Using existing local file '{}'", file.display());
                        BaselineState::Applying { file }
                    } else {
                        BaselineState::Failed {
                            reason: format!("local file '{}' does not exist", file.display()),
                        }
                    }
                }
                None => {
                    log::info!("No local file provided, skipping database population.");
                    BaselineState::Done { applied: None }
                }
            };
        }

        match &self.base_file {
            Some(base)
                if base.is_file()
                    && self.confirm.confirm(&format!(
                        "Use the bundled base file '{}' instead?",
                        base.display()
                    )) =>
            {
                log::info!("Using the bundled '{}'", base.display());
                BaselineState::Applying { file: base.clone() }
            }
            _ => {
                log::info!("Population canceled by user.");
                BaselineState::Done { applied: None }
            }
        }
    }

    async fn applying(&self, file: &Path) -> BaselineState {
        log::info!(">> Applying '{}'...", file.display());
        match self.runner.run_file(self.connection, file).await {
            Ok(0) => BaselineState::Done {
                applied: Some(file.to_path_buf()),
            },
            Ok(status) => BaselineState::Failed {
                reason: format!(
                    "applying '{}' failed, SQL client exited with status {status}",
                    file.display()
                ),
            },
            Err(e) => BaselineState::Failed {
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[path = "baseline_test.rs"]
mod tests;
