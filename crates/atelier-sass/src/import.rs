//! Import specifier resolution.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! Given an import specifier from compiled source, search the configured
//! include paths (through the resource locator) for the first matching
//! file. For every include path two candidates are tried in order: the
//! literal specifier, then the same specifier with its final segment
//! prefixed with `_` (the partial naming convention). The `.scss` extension
//! is appended when missing.
//!
//! Plain CSS imports and absolute URLs are not resolved here; they are left
//! in the output for the browser to fetch.

use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use atelier_locator::ResourceLocator;

/// Specifiers that are never resolved: vanilla CSS and external requests.
static PASSTHROUGH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.css$|^https?://").unwrap());

/// Ordered, partial-aware import search over the locator namespace.
#[derive(Clone)]
pub struct ImportResolver {
    locator: Arc<dyn ResourceLocator>,
    include_paths: Vec<String>,
}

impl ImportResolver {
    pub fn new(locator: Arc<dyn ResourceLocator>, include_paths: Vec<String>) -> Self {
        Self {
            locator,
            include_paths,
        }
    }

    /// Resolve a specifier to the first matching physical file.
    ///
    /// Deterministic: a fixed include-path order and fixed filesystem
    /// contents always yield the same result.
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        if PASSTHROUGH.is_match(specifier) {
            return None;
        }

        let candidates = [specifier.to_string(), partial_candidate(specifier)];

        for base in &self.include_paths {
            for candidate in &candidates {
                let mut file = candidate.clone();
                if !file.ends_with(".scss") {
                    file.push_str(".scss");
                }
                let logical = format!("{}/{}", base, file);
                if let Some(path) = self.locator.find_resource(&logical) {
                    return Some(path);
                }
            }
        }

        None
    }
}

/// Prefix the final path segment with `_`: `foo/bar` becomes `foo/_bar`.
fn partial_candidate(specifier: &str) -> String {
    match specifier.rfind('/') {
        Some(pos) => format!("{}/_{}", &specifier[..pos], &specifier[pos + 1..]),
        None => format!("_{}", specifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_locator::OverlayLocator;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, logical: &str, content: &str) {
        let path = root.join(logical);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn resolver(roots: &[&Path], include_paths: &[&str]) -> ImportResolver {
        let cache = std::env::temp_dir();
        let mut locator = OverlayLocator::new(cache);
        for root in roots {
            locator = locator.with_root(*root);
        }
        ImportResolver::new(
            Arc::new(locator),
            include_paths.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn test_partial_candidate() {
        assert_eq!(partial_candidate("bar"), "_bar");
        assert_eq!(partial_candidate("foo/bar"), "foo/_bar");
        assert_eq!(partial_candidate("a/b/c.scss"), "a/b/_c.scss");
    }

    #[test]
    fn test_css_and_urls_pass_through() {
        let base = TempDir::new().unwrap();
        let r = resolver(&[base.path()], &["scss"]);

        assert!(r.resolve("vendor/normalize.css").is_none());
        assert!(r.resolve("https://example.com/x").is_none());
        assert!(r.resolve("http://example.com/x.scss").is_none());
    }

    #[test]
    fn test_literal_wins_over_partial() {
        let base = TempDir::new().unwrap();
        write(base.path(), "scss/mixins.scss", "");
        write(base.path(), "scss/_mixins.scss", "");

        let r = resolver(&[base.path()], &["scss"]);
        let found = r.resolve("mixins").unwrap();
        assert!(found.ends_with("scss/mixins.scss"));
    }

    #[test]
    fn test_partial_convention() {
        let base = TempDir::new().unwrap();
        write(base.path(), "scss/foo/_bar.scss", "");

        let r = resolver(&[base.path()], &["scss"]);
        let found = r.resolve("foo/bar").unwrap();
        assert!(found.ends_with("scss/foo/_bar.scss"));
    }

    #[test]
    fn test_extension_appended_when_missing() {
        let base = TempDir::new().unwrap();
        write(base.path(), "scss/colors.scss", "");

        let r = resolver(&[base.path()], &["scss"]);
        assert!(r.resolve("colors").is_some());
        assert!(r.resolve("colors.scss").is_some());
    }

    #[test]
    fn test_include_path_order_is_respected() {
        let base = TempDir::new().unwrap();
        write(base.path(), "first/shared.scss", "");
        write(base.path(), "second/shared.scss", "");

        let r = resolver(&[base.path()], &["first", "second"]);
        let found = r.resolve("shared").unwrap();
        assert!(found.ends_with("first/shared.scss"));

        let r = resolver(&[base.path()], &["second", "first"]);
        let found = r.resolve("shared").unwrap();
        assert!(found.ends_with("second/shared.scss"));
    }

    #[test]
    fn test_unresolvable_specifier_is_none() {
        let base = TempDir::new().unwrap();
        let r = resolver(&[base.path()], &["scss"]);
        assert!(r.resolve("foo/bar").is_none());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let base = TempDir::new().unwrap();
        write(base.path(), "scss/_a.scss", "");

        let r = resolver(&[base.path()], &["scss"]);
        let first = r.resolve("a");
        let second = r.resolve("a");
        assert_eq!(first, second);
        assert!(first.is_some());
    }
}
