//! chacc - cached dependency resolution
//!
//! Resolves Python requirement sets per module, caches each result under a
//! hash of the requirements and the interpreter environment, and merges the
//! module results into one installable package set.

pub mod cache;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod manager;
pub mod packages;
pub mod resolver;
pub mod ui;

pub use error::{ChaccError, ChaccResult};
