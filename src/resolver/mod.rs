//! External dependency resolver abstraction
//!
//! The cache never resolves requirements itself. A [`Resolver`] turns one
//! module's requirement text into pinned packages and describes the
//! environment that determines its output.

pub mod pip;

pub use pip::{parse_compiled, PipCompileResolver};

use crate::cache::{Environment, PackageMap};
use crate::config::Config;
use crate::error::ChaccResult;
use async_trait::async_trait;
use std::sync::Arc;

/// How eagerly the resolver should pick versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Normal resolution
    Default,
    /// Prefer the newest releases allowed by the requirements
    Upgrade,
}

/// Abstract resolver interface
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Probe the runtime, platform and tool identity that affects resolution
    async fn environment(&self) -> ChaccResult<Environment>;

    /// Resolve one module's requirement text into `package -> version spec`
    async fn resolve(
        &self,
        module_name: &str,
        requirements: &str,
        mode: ResolveMode,
    ) -> ChaccResult<PackageMap>;

    /// Human-readable resolver name for display
    fn name(&self) -> &'static str;
}

/// Create the resolver configured for this run
pub fn create_resolver(config: &Config) -> Arc<dyn Resolver> {
    Arc::new(PipCompileResolver::new(config.resolver.clone()))
}
