//! Activate command - promote the waiting version and prune old caches

use crate::error::ShellCacheResult;
use crate::host::WorkerHost;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the activate command
pub async fn execute(host: &WorkerHost) -> ShellCacheResult<()> {
    let ctx = UiContext::detect();
    let version = &host.config().site.version;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Activating version {}...", version));

    let outcome = match host.activate().await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.stop_error("Activation failed");
            return Err(e);
        }
    };
    spinner.stop(&format!("Version {} is active", version));

    if outcome.deleted.is_empty() {
        ui::remark(&ctx, "No stale caches");
    }
    for name in &outcome.deleted {
        ui::step_info(&ctx, &format!("Deleted old cache {}", name));
    }

    Ok(())
}
