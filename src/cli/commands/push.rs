//! Push command - deliver a push event and print the notification

use crate::cli::args::PushArgs;
use crate::error::ShellCacheResult;
use crate::host::WorkerHost;
use crate::worker::{Notification, Notifier};
use async_trait::async_trait;

/// Prints notifications as JSON on stdout
struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn show(&self, notification: &Notification) -> ShellCacheResult<()> {
        println!("{}", serde_json::to_string_pretty(notification)?);
        Ok(())
    }
}

/// Execute the push command
pub async fn execute(args: PushArgs, host: &WorkerHost) -> ShellCacheResult<()> {
    let worker = host.active_worker().await?;
    worker.on_push(args.body.as_deref(), &StdoutNotifier).await?;
    Ok(())
}
