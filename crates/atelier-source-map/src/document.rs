//! Version-3 source map document model.
//!
//! Copyright (c) 2026 Atelier Contributors

use serde::{Deserialize, Serialize};

/// A version-3 source map document.
///
/// Only the fields the pipeline produces or rewrites are modeled explicitly;
/// `sources_content` is carried through untouched when a compiler provides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMapDocument {
    /// Source map format version (always 3)
    pub version: u32,

    /// Name of the generated file this map describes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Original source files, rewritten to public URLs before persistence
    #[serde(default)]
    pub sources: Vec<String>,

    /// Optional embedded source contents (parallel to `sources`)
    #[serde(
        default,
        rename = "sourcesContent",
        skip_serializing_if = "Option::is_none"
    )]
    pub sources_content: Option<Vec<Option<String>>>,

    /// Symbol names referenced by the mappings
    #[serde(default)]
    pub names: Vec<String>,

    /// VLQ-encoded mappings (may be empty when the compiler emits none)
    #[serde(default)]
    pub mappings: String,
}

impl SourceMapDocument {
    /// Create a new map for `file` covering the given source files.
    pub fn new(file: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            version: 3,
            file: Some(file.into()),
            sources,
            sources_content: None,
            names: Vec::new(),
            mappings: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_defaults() {
        let doc = SourceMapDocument::new("custom.css", vec!["custom.scss".to_string()]);
        assert_eq!(doc.version, 3);
        assert_eq!(doc.file.as_deref(), Some("custom.css"));
        assert_eq!(doc.sources, vec!["custom.scss"]);
        assert!(doc.mappings.is_empty());
    }

    #[test]
    fn test_deserialize_tolerates_missing_optional_fields() {
        let doc: SourceMapDocument =
            serde_json::from_str(r#"{"version":3,"sources":["a.scss"],"mappings":"AAAA"}"#)
                .unwrap();
        assert_eq!(doc.sources, vec!["a.scss"]);
        assert!(doc.file.is_none());
        assert!(doc.names.is_empty());
    }

    #[test]
    fn test_serialize_skips_absent_file() {
        let mut doc = SourceMapDocument::new("custom.css", vec![]);
        doc.file = None;
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("\"file\""));
        assert!(!json.contains("sourcesContent"));
    }

    #[test]
    fn test_sources_content_round_trip() {
        let json = r#"{"version":3,"sources":["a.scss"],"sourcesContent":["$x: 1;"],"mappings":""}"#;
        let doc: SourceMapDocument = serde_json::from_str(json).unwrap();
        assert_eq!(
            doc.sources_content,
            Some(vec![Some("$x: 1;".to_string())])
        );
        let out = serde_json::to_string(&doc).unwrap();
        assert!(out.contains("sourcesContent"));
    }
}
