//! Update engine for dbup.
//!
//! Keeps a ledger of applied update scripts inside each target database,
//! classifies on-disk scripts against it, applies pending ones in order, and
//! drives the create -> populate -> update lifecycle of every database.

pub mod baseline;
pub mod confirm;
pub mod download;
pub mod error;
pub mod fetcher;
pub mod ledger;
pub mod lifecycle;
pub mod loader;
pub mod plan;
pub mod policy;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use baseline::{BaselineResolver, BaselineState};
pub use confirm::{ConfirmationProvider, ConsolePrompt, NonInteractive};
pub use download::{BaselineDownloader, HttpDownloader};
pub use error::{UpdaterError, UpdaterResult};
pub use fetcher::{UpdateFetcher, UpdateSource};
pub use ledger::{SqlLedger, UpdateLedger, LEDGER_TABLE};
pub use lifecycle::{DbUpdater, UpdaterServices, UpdaterSettings};
pub use loader::{DatabaseLoader, DatabaseTarget};
pub use plan::{build_plan, Classification, DeadReference, PendingReason, PlannedFile, UpdatePlan};
pub use policy::{policy_for, BaseLocation, DatabasePolicy};
