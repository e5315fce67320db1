//! Spinners and the precache progress bar

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A spinner that degrades to `...` lines outside a terminal
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress over the static asset list during install
///
/// Assets are fetched concurrently, so the bar counts completions rather
/// than following list order.
pub struct PrecacheProgress {
    bar: Option<ProgressBar>,
}

impl PrecacheProgress {
    pub fn new(ctx: &UiContext, total: u64) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total);
            if let Ok(template) = ProgressStyle::default_bar()
                .template("  {spinner:.blue} Precaching  {bar:24.blue/dim} {pos}/{len} {msg:.dim}")
            {
                bar.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ").progress_chars("━╸─"));
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Precaching {} assets...", total);
            None
        };
        Self { bar }
    }

    /// One asset fetched successfully
    pub fn on_cached(&self, path: &str) {
        match self.bar {
            Some(ref bar) => {
                bar.inc(1);
                bar.set_message(path.to_string());
            }
            None => println!("  cached {}", path),
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Activating...");
        spinner.stop("Done");
    }

    #[test]
    fn precache_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = PrecacheProgress::new(&ctx, 2);
        progress.on_cached("/");
        progress.on_cached("/index.html");
        progress.finish();
        assert!(progress.bar.is_none());
    }
}
