//! Plan command implementation

use anyhow::{Context, Result};
use dbup_core::DatabaseKind;
use dbup_updater::{
    policy_for, DatabaseLoader, DatabaseTarget, HttpDownloader, NonInteractive, UpdatePlan,
};
use serde::Serialize;

use crate::cli::{GlobalArgs, PlanArgs, PlanOutput};
use crate::commands::common::{connect_all, load_config, select_databases};

/// One planned file, flattened for output
#[derive(Debug, Serialize)]
struct PlanRow {
    database: DatabaseKind,
    path: String,
    directory: String,
    action: String,
    hash: String,
}

/// Dead reference, flattened for output
#[derive(Debug, Serialize)]
struct DeadRow {
    database: DatabaseKind,
    path: String,
    missing_runs: u32,
}

#[derive(Debug, Serialize)]
struct PlanReport {
    files: Vec<PlanRow>,
    dead_references: Vec<DeadRow>,
}

/// Execute the plan command
pub(crate) async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let kinds = select_databases(&config, &args.databases)?;
    let backends = connect_all(&config, &kinds)?;
    let downloader = HttpDownloader::new()?;
    let loader = DatabaseLoader::new(&config, &NonInteractive, &downloader);

    let mut report = PlanReport {
        files: Vec::new(),
        dead_references: Vec::new(),
    };
    for (kind, backend) in &backends {
        let target = DatabaseTarget {
            kind: *kind,
            db: backend.db(),
            runner: backend.runner(),
        };
        let plan = loader
            .updater(&target)
            .plan()
            .await
            .with_context(|| format!("Failed to plan the {kind} database"))?;
        if args.output == PlanOutput::Table {
            log::info!("{}", summarize(*kind, &plan));
        }
        append(&mut report, *kind, plan);
    }

    match args.output {
        PlanOutput::Table => print_table(&report),
        PlanOutput::Json => print_json(&report)?,
    }
    Ok(())
}

fn append(report: &mut PlanReport, kind: DatabaseKind, plan: UpdatePlan) {
    report
        .files
        .extend(plan.entries.into_iter().map(|entry| PlanRow {
            database: kind,
            action: entry.classification.to_string(),
            directory: entry.script.directory_class.to_string(),
            path: entry.script.path,
            hash: entry.script.hash,
        }));
    report
        .dead_references
        .extend(plan.dead_references.into_iter().map(|dead| DeadRow {
            database: kind,
            path: dead.path,
            missing_runs: dead.missing_runs,
        }));
}

fn summarize(kind: DatabaseKind, plan: &UpdatePlan) -> String {
    let name = policy_for(kind).table_name();
    if plan.is_noop() {
        return format!("{name}: up-to-date");
    }
    format!(
        "{name}: {} to apply, {} renamed, {} to archive, {} dead",
        plan.pending().count(),
        plan.count("renamed"),
        plan.count("archived-redundant"),
        plan.dead_references.len()
    )
}

fn print_table(report: &PlanReport) {
    if report.files.is_empty() && report.dead_references.is_empty() {
        println!("No update scripts found.");
        return;
    }

    let db_width = report
        .files
        .iter()
        .map(|r| r.database.slug().len())
        .max()
        .unwrap_or(8)
        .max(8);
    let path_width = report
        .files
        .iter()
        .map(|r| r.path.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let dir_width = 9;

    println!(
        "{:<db_width$}  {:<path_width$}  {:<dir_width$}  {:<7}  ACTION",
        "DATABASE", "PATH", "DIRECTORY", "HASH",
    );
    println!(
        "{:-<db_width$}  {:-<path_width$}  {:-<dir_width$}  {:-<7}  {}",
        "",
        "",
        "",
        "",
        "-".repeat(30),
    );
    for row in &report.files {
        println!(
            "{:<db_width$}  {:<path_width$}  {:<dir_width$}  {:<7}  {}",
            row.database.slug(),
            row.path,
            row.directory,
            row.hash.get(..7).unwrap_or(&row.hash),
            row.action,
        );
    }

    if !report.dead_references.is_empty() {
        println!();
        println!("Dead references:");
        for dead in &report.dead_references {
            println!(
                "  {} {} (missing for {} run(s))",
                dead.database.slug(),
                dead.path,
                dead.missing_runs
            );
        }
    }
}

fn print_json(report: &PlanReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
