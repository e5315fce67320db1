//! Install command - precache the configured version

use crate::cli::args::InstallArgs;
use crate::error::ShellCacheResult;
use crate::host::WorkerHost;
use crate::ui::{self, PrecacheProgress, UiContext};

/// Execute the install command
pub async fn execute(args: InstallArgs, host: &WorkerHost) -> ShellCacheResult<()> {
    let ctx = UiContext::detect();
    let site = &host.config().site;
    ui::intro(&ctx, &format!("Installing {} v{}", site.name, site.version));

    let progress = PrecacheProgress::new(&ctx, host.config().precache.assets.len() as u64);
    let result = host
        .install(args.force, &|path| progress.on_cached(path))
        .await;
    progress.finish();

    match result? {
        None => ui::step_warn_hint(
            &ctx,
            &format!("Version {} is already installed", site.version),
            "Use --force to reinstall",
        ),
        Some(outcome) => {
            ui::step_ok_detail(
                &ctx,
                &format!("Cached {} assets", outcome.assets),
                &outcome.partition,
            );
            ui::outro_success(&ctx, "Installed. Run: shellcache activate");
        }
    }

    Ok(())
}
