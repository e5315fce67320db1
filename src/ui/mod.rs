//! Terminal output for the `shellcache` CLI
//!
//! Uses `cliclack` for prompts and step logging with a plain-text fallback
//! when stdout is not a terminal or a CI environment is detected.
//!
//! # Example
//!
//! ```rust,ignore
//! use shellcache::ui::{self, UiContext, PrecacheProgress};
//!
//! let ctx = UiContext::detect();
//!
//! ui::intro(&ctx, "Installing jeressar v1.0.0");
//! let progress = PrecacheProgress::new(&ctx, assets.len() as u64);
//! // ... progress.on_cached(path) per asset ...
//! progress.finish();
//! ui::outro_success(&ctx, "Installed");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, outro_warn, remark, section, step_info,
    step_ok, step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{PrecacheProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, ShellCacheTheme};
