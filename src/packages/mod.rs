//! Package names and the installed-package environment
//!
//! Package names from requirement files, pip-compile output and `pip list`
//! are spelled differently (`Flask_SQLAlchemy` vs `flask-sqlalchemy`), so all
//! comparisons go through [`canonicalize_name`].

pub mod pip;

pub use pip::{OutdatedPackage, Pip};

/// Normalize a package name for comparison.
///
/// Lowercases and collapses every run of `-`, `_` and `.` into a single `-`.
pub fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;

    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }

    out
}

/// Split `name[extra1,extra2]` into the bare name and its extras.
pub fn split_extras(name: &str) -> (&str, Vec<&str>) {
    match name.find('[') {
        Some(open) => {
            let base = &name[..open];
            let rest = &name[open + 1..];
            let inner = rest.strip_suffix(']').unwrap_or(rest);
            let extras = inner
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .collect();
            (base.trim(), extras)
        }
        None => (name.trim(), vec![]),
    }
}

/// Canonical cache key for a package name, keeping extras as a sorted suffix.
pub fn canonical_key(name: &str) -> String {
    let (base, extras) = split_extras(name);
    let base = canonicalize_name(base);

    if extras.is_empty() {
        return base;
    }

    let mut extras: Vec<String> = extras.into_iter().map(canonicalize_name).collect();
    extras.sort();
    extras.dedup();
    format!("{}[{}]", base, extras.join(","))
}

/// Canonical name of a cache key with any extras removed.
pub fn base_name(key: &str) -> String {
    canonicalize_name(split_extras(key).0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_collapses_separators() {
        assert_eq!(canonicalize_name("Flask_SQLAlchemy"), "flask-sqlalchemy");
        assert_eq!(canonicalize_name("zope.interface"), "zope-interface");
        assert_eq!(canonicalize_name("a-_.b"), "a-b");
        assert_eq!(canonicalize_name("  Requests "), "requests");
    }

    #[test]
    fn split_extras_parses_brackets() {
        assert_eq!(split_extras("requests"), ("requests", vec![]));
        assert_eq!(
            split_extras("requests[socks, security]"),
            ("requests", vec!["socks", "security"])
        );
    }

    #[test]
    fn canonical_key_sorts_extras() {
        assert_eq!(
            canonical_key("Requests[Socks,security]"),
            "requests[security,socks]"
        );
        assert_eq!(canonical_key("PyYAML"), "pyyaml");
    }

    #[test]
    fn base_name_strips_extras() {
        assert_eq!(base_name("uvicorn[standard]"), "uvicorn");
        assert_eq!(base_name("Django"), "django");
    }
}
