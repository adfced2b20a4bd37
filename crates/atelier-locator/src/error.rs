//! Error types for resource location.
//!
//! Copyright (c) 2026 Atelier Contributors

use thiserror::Error;

/// Errors that can occur while resolving or creating resources
#[derive(Debug, Error)]
pub enum LocatorError {
    /// The logical path is malformed (absolute, empty, or escaping the roots)
    #[error("invalid logical path: {path}")]
    InvalidLogicalPath { path: String },

    /// File I/O error (directory creation, metadata access)
    #[error("failed to access resource: {0}")]
    Io(#[from] std::io::Error),
}
