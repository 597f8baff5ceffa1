//! CLI command implementations

pub(crate) mod common;
pub(crate) mod ledger;
pub(crate) mod plan;
pub(crate) mod update;
