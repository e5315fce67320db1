//! Interactive vs plain output detection

use std::io::IsTerminal;

/// Environment variables set by common CI providers
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// Decides how the CLI renders output and handles prompts
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    /// `--yes` was passed
    auto_yes: bool,
}

impl UiContext {
    /// Interactive only when both stdin and stdout are terminals outside CI
    pub fn detect() -> Self {
        let interactive = std::io::stdout().is_terminal()
            && std::io::stdin().is_terminal()
            && !CI_VARS.iter().any(|var| std::env::var_os(var).is_some());
        Self {
            interactive,
            auto_yes: false,
        }
    }

    /// Plain output, prompts fall back to their defaults
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Spinners, progress bars and cliclack step markers
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_context() {
        let ctx = UiContext::non_interactive();
        assert!(!ctx.is_interactive());
        assert!(!ctx.use_fancy_output());
        assert!(!ctx.auto_yes());
    }

    #[test]
    fn with_auto_yes() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        assert!(ctx.auto_yes());
    }
}
