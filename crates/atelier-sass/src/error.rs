//! Error types for compiler engines.
//!
//! Copyright (c) 2026 Atelier Contributors

use std::time::Duration;

use thiserror::Error;

/// Errors reported by a compiler engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// No include path yielded a match for a required import
    #[error("unable to resolve import \"{specifier}\"")]
    UnresolvedImport { specifier: String },

    /// The back-end rejected the source (syntax or semantic error)
    #[error("compilation failed: {message}")]
    CompilationFailed { message: String },

    /// Compilation overran the configured deadline
    #[error("compilation exceeded the {limit:?} deadline")]
    DeadlineExceeded { limit: Duration },
}
