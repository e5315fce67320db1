//! Sync command - deliver a background sync event

use crate::cli::args::SyncArgs;
use crate::error::ShellCacheResult;
use crate::host::WorkerHost;
use crate::ui::{self, UiContext};
use crate::worker::SyncOutcome;

/// Execute the sync command
pub async fn execute(args: SyncArgs, host: &WorkerHost) -> ShellCacheResult<()> {
    let ctx = UiContext::detect();
    let worker = host.active_worker().await?;

    match worker.on_sync(&args.tag).await? {
        SyncOutcome::Handled => ui::step_ok(&ctx, &format!("Sync '{}' handled", args.tag)),
        SyncOutcome::Ignored => ui::step_warn(&ctx, &format!("Sync '{}' ignored", args.tag)),
    }

    Ok(())
}
