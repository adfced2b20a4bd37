//! Error types for the build pipeline.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! Only compilation failures and filesystem failures cross this boundary as
//! hard errors. Lock contention and source-map decode failures are soft
//! outcomes (`CompileOutcome::Skipped` and per-artifact warnings).

use thiserror::Error;

use atelier_sass::EngineError;

/// Hard failures surfaced by `compile_file`
#[derive(Debug, Error)]
pub enum BuildError {
    /// The compiler rejected the source, an import was unresolvable, or the
    /// deadline was exceeded
    #[error("compilation of '{name}' failed: {source}")]
    Compilation {
        name: String,
        #[source]
        source: EngineError,
    },

    /// The output path could not be resolved or created
    #[error(transparent)]
    Locator(#[from] atelier_locator::LocatorError),

    /// Artifact, map or lock file I/O failed
    #[error("filesystem failure: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata record could not be serialized
    #[error("failed to encode metadata record: {0}")]
    Metadata(#[from] serde_json::Error),
}
