//! Source map handling for compiled stylesheets.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! This crate provides:
//! - `SourceMapDocument`: serde model of a version-3 source map
//! - Inline map extraction from compiler output
//! - `sources` rewriting from physical paths to public URLs
//!
//! The compiler engine emits its map as a trailing
//! `/*# sourceMappingURL=data:application/json;base64,... */` comment; the
//! build pipeline extracts it, rewrites it and persists it as a sibling
//! `<output>.map` file.

mod document;
mod rewrite;

pub use document::SourceMapDocument;
pub use rewrite::{
    MapExtraction, SourceMapError, extract_inline_map, external_map_reference,
    inline_map_comment, rewrite_sources,
};
