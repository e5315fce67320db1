//! Clear command - delete every partition and unregister

use crate::cli::args::ClearArgs;
use crate::error::ShellCacheResult;
use crate::host::WorkerHost;
use crate::ui::{self, UiContext};

/// Execute the clear command
pub async fn execute(args: ClearArgs, host: &WorkerHost) -> ShellCacheResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);

    let partitions = host.storage().keys().await?;
    let registered = host.registration().await?.is_some();
    if partitions.is_empty() && !registered {
        ui::step_info(&ctx, "Nothing to clear");
        return Ok(());
    }

    let prompt = format!(
        "Delete {} cache partition(s) and unregister {}?",
        partitions.len(),
        host.config().site.origin
    );
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::outro_warn(&ctx, "Cancelled (use --yes to skip confirmation)");
        return Ok(());
    }

    let deleted = host.clear().await?;
    for name in &deleted {
        ui::step_ok(&ctx, &format!("Deleted {}", name));
    }
    ui::outro_success(&ctx, "Cleared");

    Ok(())
}
