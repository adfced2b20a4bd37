//! Overlay-based resource location.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! A logical path such as `theme/scss/variables.scss` is resolved against an
//! ordered list of physical search roots. The first root that contains the
//! path wins, which is what gives theme overrides precedence over the base
//! theme and the cache. New artifacts are always created under a single
//! designated writable root.

use std::path::{Path, PathBuf};

use crate::error::LocatorError;

/// Capability trait for resolving logical resource paths.
///
/// Implementations own the ordered search roots; callers only ever deal in
/// logical paths with `/` separators. The trait is object-safe so the build
/// pipeline can hold an `Arc<dyn ResourceLocator>`.
pub trait ResourceLocator: Send + Sync {
    /// Resolve a logical path to the first existing physical path.
    ///
    /// Returns `None` when no search root contains the path, or when the
    /// logical path is malformed.
    fn find_resource(&self, logical: &str) -> Option<PathBuf>;

    /// Resolve a logical path to the first existing physical directory.
    fn find_directory(&self, logical: &str) -> Option<PathBuf>;

    /// Resolve a logical path to its canonical writable location, creating
    /// parent directories as needed. The file itself is not created.
    fn find_or_create_resource(&self, logical: &str) -> Result<PathBuf, LocatorError>;

    /// The root new artifacts are created under. Cache purges are scoped
    /// to this root so shared theme sources are never touched.
    fn writable_root(&self) -> &Path;

    /// Map a physical path back to its logical form (with `/` separators).
    ///
    /// Returns `None` when the path lies outside every search root. Used to
    /// build public URLs without leaking the local filesystem layout.
    fn relativize(&self, physical: &Path) -> Option<String>;
}

/// Standard locator: ordered overlay roots plus one writable cache root.
///
/// Search order is the override roots in the order they were added, followed
/// by the writable root. The writable root is where new artifacts land.
#[derive(Debug, Clone)]
pub struct OverlayLocator {
    roots: Vec<PathBuf>,
    writable: PathBuf,
}

impl OverlayLocator {
    /// Create a locator with only a writable root.
    pub fn new(writable: impl Into<PathBuf>) -> Self {
        Self {
            roots: Vec::new(),
            writable: writable.into(),
        }
    }

    /// Append a search root. Earlier roots shadow later ones.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// The ordered search roots, writable root last.
    pub fn search_roots(&self) -> impl Iterator<Item = &PathBuf> {
        self.roots.iter().chain(std::iter::once(&self.writable))
    }

}

impl ResourceLocator for OverlayLocator {
    fn find_resource(&self, logical: &str) -> Option<PathBuf> {
        let relative = match normalize(logical) {
            Ok(relative) => relative,
            Err(_) => {
                tracing::warn!(path = logical, "rejected malformed logical path");
                return None;
            }
        };
        for root in self.search_roots() {
            let candidate = root.join(&relative);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    fn find_directory(&self, logical: &str) -> Option<PathBuf> {
        let relative = normalize(logical).ok()?;
        for root in self.search_roots() {
            let candidate = root.join(&relative);
            if candidate.is_dir() {
                return Some(candidate);
            }
        }
        None
    }

    fn find_or_create_resource(&self, logical: &str) -> Result<PathBuf, LocatorError> {
        let relative = normalize(logical)?;
        let path = self.writable.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn writable_root(&self) -> &Path {
        &self.writable
    }

    fn relativize(&self, physical: &Path) -> Option<String> {
        for root in self.search_roots() {
            if let Ok(relative) = physical.strip_prefix(root) {
                let logical = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                return Some(logical);
            }
        }
        None
    }
}

/// Validate a logical path and turn it into a relative `PathBuf`.
///
/// Absolute paths, empty paths and `..` segments are rejected so a logical
/// path can never escape its search root.
fn normalize(logical: &str) -> Result<PathBuf, LocatorError> {
    let invalid = || LocatorError::InvalidLogicalPath {
        path: logical.to_string(),
    };

    if logical.is_empty() || logical.starts_with('/') {
        return Err(invalid());
    }

    let mut relative = PathBuf::new();
    for segment in logical.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(invalid()),
            _ => relative.push(segment),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(invalid());
    }
    Ok(relative)
}
