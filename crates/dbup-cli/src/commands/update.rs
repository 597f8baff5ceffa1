//! Update command implementation

use anyhow::Result;
use dbup_core::DatabaseKind;
use dbup_updater::{
    ConfirmationProvider, ConsolePrompt, DatabaseLoader, DatabaseTarget, HttpDownloader,
    NonInteractive,
};

use crate::cli::{GlobalArgs, UpdateArgs};
use crate::commands::common::{connect_all, load_config, select_databases, ExitCode};

/// Execute the update command
pub(crate) async fn execute(args: &UpdateArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = load_config(global)?;
    let kinds = select_databases(&config, &args.databases)?;
    if kinds.is_empty() {
        log::warn!("No databases are enabled, nothing to update");
        return Ok(());
    }
    if !args.databases.is_empty() {
        config.updates.enable_databases = DatabaseKind::mask_of(&kinds);
    }

    let backends = connect_all(&config, &kinds)?;
    let targets: Vec<DatabaseTarget<'_>> = backends
        .iter()
        .map(|(kind, backend)| DatabaseTarget {
            kind: *kind,
            db: backend.db(),
            runner: backend.runner(),
        })
        .collect();

    let confirm: Box<dyn ConfirmationProvider> = if args.non_interactive {
        Box::new(NonInteractive)
    } else {
        ConsolePrompt::detect()
    };
    let downloader = HttpDownloader::new()?;

    let loader = DatabaseLoader::new(&config, confirm.as_ref(), &downloader);
    if !loader.load(&targets).await {
        return Err(ExitCode(1).into());
    }
    Ok(())
}
