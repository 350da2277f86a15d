//! Output context: interactive terminal vs CI, prompt policy, verbosity

use std::io::IsTerminal;

/// Environment variables that mark a CI run
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "JENKINS_URL",
    "BUILDKITE",
    "TF_BUILD",
];

/// Determines how commands render output
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    auto_yes: bool,
    verbosity: u8,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::detect_interactive(),
            auto_yes: false,
            verbosity: 0,
        }
    }

    /// Plain output, no prompts (tests and CI)
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
            verbosity: 0,
        }
    }

    /// Auto-approve confirmation prompts
    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    /// Set the `-v` count
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Whether prompts can be shown
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Whether prompts should be auto-approved
    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Whether to use spinners and cliclack formatting
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }

    /// Whether to print full resolver/installer error output
    pub fn show_details(&self) -> bool {
        self.verbosity > 0
    }

    fn detect_interactive() -> bool {
        if !std::io::stdout().is_terminal() || !std::io::stdin().is_terminal() {
            return false;
        }

        !CI_VARS.iter().any(|var| std::env::var(var).is_ok())
    }
}
