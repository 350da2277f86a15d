//! Environment and module fingerprints
//!
//! Every hash is SHA256 over length-prefixed fields, so `("ab", "c")` and
//! `("a", "bc")` never produce the same digest.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identity of everything besides requirement text that can change resolver output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Environment {
    /// Interpreter version string (e.g. `3.12.1 (main, ...)`)
    pub runtime: String,

    /// Platform identifier (OS, architecture, interpreter platform tag)
    pub platform: String,

    /// Resolver tool identity (e.g. `pip-compile 7.4.1`)
    pub resolver: String,
}

impl Environment {
    /// Create an environment description
    pub fn new(
        runtime: impl Into<String>,
        platform: impl Into<String>,
        resolver: impl Into<String>,
    ) -> Self {
        Self {
            runtime: runtime.into(),
            platform: platform.into(),
            resolver: resolver.into(),
        }
    }

    /// Fingerprint of this environment
    pub fn fingerprint(&self) -> String {
        environment_fingerprint(self)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} ({})", self.runtime, self.platform, self.resolver)
    }
}

/// Hash a domain tag plus a list of fields
fn digest_fields(domain: &str, fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update([0u8]);

    for field in fields {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }

    hex::encode(hasher.finalize())
}

/// Deterministic hash of the ambient runtime, platform and resolver identity
pub fn environment_fingerprint(env: &Environment) -> String {
    digest_fields(
        "chacc-environment-v1",
        &[env.runtime.as_str(), env.platform.as_str(), env.resolver.as_str()],
    )
}

/// Hash of one module's resolvable input under a given environment
pub fn module_hash(module_name: &str, requirements: &str, environment_fingerprint: &str) -> String {
    digest_fields(
        "chacc-module-v1",
        &[module_name, requirements, environment_fingerprint],
    )
}

/// Hash over already-sorted `(module, hash)` pairs and the environment
pub(crate) fn pairs_hash<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    environment_fingerprint: &str,
) -> String {
    let mut fields = vec![environment_fingerprint];
    for (module, hash) in pairs {
        fields.push(module);
        fields.push(hash);
    }
    digest_fields("chacc-combined-v1", &fields)
}
