//! Resource location for the Atelier theme pipeline.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! This crate provides:
//! - The `ResourceLocator` capability trait: logical paths resolved against
//!   an ordered list of physical search roots
//! - `OverlayLocator`, the standard implementation (theme overrides first,
//!   base theme, cache)

mod error;
mod overlay;

pub use error::LocatorError;
pub use overlay::{OverlayLocator, ResourceLocator};
