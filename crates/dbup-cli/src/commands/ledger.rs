//! Ledger command implementation

use anyhow::{Context, Result};
use dbup_core::{UpdateRecord, UpdateState};
use dbup_updater::{SqlLedger, UpdateLedger, LEDGER_TABLE};

use crate::cli::{GlobalArgs, LedgerArgs, LedgerOutput};
use crate::commands::common::{load_config, Backend};

/// Execute the ledger command
pub(crate) async fn execute(args: &LedgerArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let backend = Backend::connect(&config, args.database)?;

    let Some(ledger) = SqlLedger::existing(backend.db()).await? else {
        log::warn!(
            "The {} database has no {LEDGER_TABLE} table yet",
            args.database
        );
        return match args.output {
            LedgerOutput::Table => Ok(()),
            LedgerOutput::Json => print_json(&[]),
        };
    };

    let records = ledger
        .list_all()
        .await
        .with_context(|| format!("Failed to read the {} ledger", args.database))?;
    let records = filter_records(records, args.archived);

    match args.output {
        LedgerOutput::Table => print_table(&records),
        LedgerOutput::Json => print_json(&records)?,
    }
    Ok(())
}

fn filter_records(records: Vec<UpdateRecord>, archived_only: bool) -> Vec<UpdateRecord> {
    if !archived_only {
        return records;
    }
    records
        .into_iter()
        .filter(|r| r.state == UpdateState::Archived)
        .collect()
}

fn print_table(records: &[UpdateRecord]) {
    if records.is_empty() {
        println!("No applied updates recorded.");
        return;
    }

    let path_width = records
        .iter()
        .map(|r| r.path.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let state_width = 8;
    let applied_width = 20;

    println!(
        "{:<path_width$}  {:<7}  {:<state_width$}  {:<applied_width$}  {:>9}  MISSING",
        "PATH", "HASH", "STATE", "APPLIED", "SPEED_MS",
    );
    println!(
        "{:-<path_width$}  {:-<7}  {:-<state_width$}  {:-<applied_width$}  {:->9}  {}",
        "",
        "",
        "",
        "",
        "",
        "-".repeat(7),
    );
    for record in records {
        println!(
            "{:<path_width$}  {:<7}  {:<state_width$}  {:<applied_width$}  {:>9}  {}",
            record.path,
            record.hash.get(..7).unwrap_or(&record.hash),
            record.state.to_string(),
            record.applied_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.speed_ms,
            record.missing_runs,
        );
    }
}

fn print_json(records: &[UpdateRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
