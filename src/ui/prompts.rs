//! Confirmation prompt with non-interactive fallback

use super::context::UiContext;
use crate::error::{ShellCacheError, ShellCacheResult};

/// Ask for confirmation; returns `true` under `--yes` and `default` when
/// there is no terminal to ask on
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> ShellCacheResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message).initial_value(default).interact()
    })
    .await
    .map_err(|e| ShellCacheError::Internal(format!("prompt task failed: {}", e)))?;

    result.map_err(|e| ShellCacheError::io("reading confirmation", e))
}
