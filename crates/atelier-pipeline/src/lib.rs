//! Build orchestration for compiled theme stylesheets.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! This crate ties the pipeline together:
//! - `StylesheetBuilder`: the `compile_file` orchestrator (lock, compile,
//!   post-process, persist, record metadata)
//! - `ArtifactLock`: cooperative non-blocking file locking, so concurrent
//!   requests never compile the same artifact twice
//! - `Checksum` / `MetadataStore`: staleness detection over the final
//!   rendered output

mod builder;
mod checksum;
mod error;
mod lock;
mod write;

pub use builder::{
    BuildConfig, CompileOutcome, DEVELOPMENT_BANNER, EMPTY_IMPORT_IS_NOT_AN_ERROR,
    StylesheetBuilder,
};
pub use checksum::{Checksum, MetadataRecord, MetadataStore};
pub use error::BuildError;
pub use lock::{ArtifactLock, LockAttempt, LockGuard};
