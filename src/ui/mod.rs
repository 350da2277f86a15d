//! Terminal output for the `cdm` commands
//!
//! Uses `cliclack` spinners and log lines on a terminal, with plain
//! `[OK]`/`[WARN]`/`[FAIL]` lines when piped or running in CI.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    bullet, intro, key_value, outro_success, outro_warn, step_error, step_error_detail,
    step_info, step_ok, step_warn,
};
pub use progress::TaskSpinner;
pub use prompts::confirm;

use cliclack::ThemeState;
use console::Style;

/// Only the bar is recoloured; symbols keep cliclack's defaults
struct CdmTheme;

impl cliclack::Theme for CdmTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active | ThemeState::Submit => Style::new().magenta(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
        }
    }
}

/// Install the `cdm` theme for all prompts and spinners
pub fn init_theme() {
    cliclack::set_theme(CdmTheme);
}
