//! Command-line interface for `cdm`

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
