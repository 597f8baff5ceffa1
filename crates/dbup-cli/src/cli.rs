//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use dbup_core::DatabaseKind;

/// dbup - keeps server databases in sync with their SQL update scripts
#[derive(Parser, Debug)]
#[command(name = "dbup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory containing dbup.yml
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, populate and update the enabled databases
    Update(UpdateArgs),

    /// Show what an update would do without changing anything
    Plan(PlanArgs),

    /// List the applied updates recorded in a database
    Ledger(LedgerArgs),
}

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Databases to process (comma-separated, default: updates.enable_databases)
    #[arg(short, long = "database", value_delimiter = ',')]
    pub databases: Vec<DatabaseKind>,

    /// Never prompt; every question is answered "no"
    #[arg(long)]
    pub non_interactive: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Databases to plan (comma-separated, default: updates.enable_databases)
    #[arg(short, long = "database", value_delimiter = ',')]
    pub databases: Vec<DatabaseKind>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: PlanOutput,
}

/// Plan output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutput {
    /// Human-readable table
    Table,
    /// JSON array
    Json,
}

/// Arguments for the ledger command
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Database whose ledger to list
    #[arg(short, long)]
    pub database: DatabaseKind,

    /// Only show archived records
    #[arg(long)]
    pub archived: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LedgerOutput,
}

/// Ledger output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutput {
    /// Human-readable table
    Table,
    /// JSON array
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
