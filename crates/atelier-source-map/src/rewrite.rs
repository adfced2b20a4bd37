//! Inline map extraction and source rewriting.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! Compiler output carries at most one trailing inline source-map comment:
//!
//! ```text
//! /*# sourceMappingURL=data:application/json;base64,eyJ2ZXJzaW9uIjozfQ== */
//! ```
//!
//! Extraction strips that comment and decodes the embedded document. A
//! document that fails to decode is a soft condition: the stylesheet is
//! still served, just without a usable map.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::document::SourceMapDocument;

/// Comment prefix marking an inline or external source map reference.
const SOURCE_MAP_MARKER: &str = "/*# sourceMappingURL=";

/// Data URI prefix for an inline, base64-encoded JSON map.
const INLINE_DATA_PREFIX: &str = "data:application/json;base64,";

/// Errors that can occur while encoding or decoding source maps
#[derive(Debug, Error)]
pub enum SourceMapError {
    /// The inline payload is not valid base64 or not valid JSON
    #[error("failed to decode inline source map: {reason}")]
    Decode { reason: String },

    /// The document could not be serialized
    #[error("failed to encode source map: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outcome of scanning compiler output for an inline source map.
///
/// `Invalid` is the expected soft-failure path: the marker was present but
/// its payload could not be decoded. Callers log it and carry on.
#[derive(Debug)]
pub enum MapExtraction {
    /// No source map comment was present
    Absent,
    /// A map was extracted and decoded
    Extracted(SourceMapDocument),
    /// A map comment was present but could not be decoded
    Invalid { reason: String },
}

/// Scan `css` for a trailing inline source-map comment.
///
/// Returns the stylesheet with the comment stripped, together with the
/// extraction outcome. Output without a marker is returned unchanged.
pub fn extract_inline_map(css: &str) -> (String, MapExtraction) {
    let Some(pos) = css.rfind(SOURCE_MAP_MARKER) else {
        return (css.to_string(), MapExtraction::Absent);
    };

    let comment = &css[pos..];
    let stripped = css[..pos].trim_end().to_string();

    let payload = comment
        .strip_prefix(SOURCE_MAP_MARKER)
        .and_then(|rest| rest.trim_end().strip_suffix("*/"))
        .map(str::trim);

    let Some(payload) = payload else {
        // Unterminated comment; treat the marker as garbage and drop it.
        tracing::warn!("unterminated sourceMappingURL comment in compiler output");
        return (
            stripped,
            MapExtraction::Invalid {
                reason: "unterminated sourceMappingURL comment".to_string(),
            },
        );
    };

    let Some(encoded) = payload.strip_prefix(INLINE_DATA_PREFIX) else {
        // An external reference, not an inline map. Nothing to extract.
        return (css.to_string(), MapExtraction::Absent);
    };

    match decode_inline(encoded) {
        Ok(doc) => (stripped, MapExtraction::Extracted(doc)),
        Err(e) => {
            tracing::warn!(error = %e, "discarding undecodable inline source map");
            (
                stripped,
                MapExtraction::Invalid {
                    reason: e.to_string(),
                },
            )
        }
    }
}

fn decode_inline(encoded: &str) -> Result<SourceMapDocument, SourceMapError> {
    let bytes = STANDARD.decode(encoded).map_err(|e| SourceMapError::Decode {
        reason: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| SourceMapError::Decode {
        reason: e.to_string(),
    })
}

/// Render a document as an inline source-map comment.
///
/// Used by compiler engines that synthesize their own maps.
pub fn inline_map_comment(doc: &SourceMapDocument) -> Result<String, SourceMapError> {
    let json = serde_json::to_vec(doc)?;
    Ok(format!(
        "{}{}{} */",
        SOURCE_MAP_MARKER,
        INLINE_DATA_PREFIX,
        STANDARD.encode(json)
    ))
}

/// Render the external reference comment pointing at a sibling `.map` file.
pub fn external_map_reference(map_basename: &str) -> String {
    format!("{}{} */", SOURCE_MAP_MARKER, map_basename)
}

/// Rewrite every entry of `sources` through `to_public`.
///
/// When the callback cannot produce a public URL for an entry (a file
/// outside every known root), the entry falls back to its final path
/// segment so no absolute filesystem path ever reaches the persisted map.
pub fn rewrite_sources(
    doc: &mut SourceMapDocument,
    mut to_public: impl FnMut(&str) -> Option<String>,
) {
    for source in &mut doc.sources {
        *source = match to_public(source) {
            Some(url) => url,
            None => source
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or(source)
                .to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_absent() {
        let css = ".a {\n  color: red;\n}\n";
        let (out, extraction) = extract_inline_map(css);
        assert_eq!(out, css);
        assert!(matches!(extraction, MapExtraction::Absent));
    }

    #[test]
    fn test_inline_round_trip() {
        let doc = SourceMapDocument::new("custom.css", vec!["/abs/custom.scss".to_string()]);
        let comment = inline_map_comment(&doc).unwrap();
        let css = format!(".a {{ color: red; }}\n\n{}", comment);

        let (stripped, extraction) = extract_inline_map(&css);
        assert_eq!(stripped, ".a { color: red; }");
        match extraction {
            MapExtraction::Extracted(decoded) => assert_eq!(decoded, doc),
            other => panic!("expected extracted map, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_payload_is_soft() {
        let css = ".a { }\n/*# sourceMappingURL=data:application/json;base64,!!notbase64 */";
        let (stripped, extraction) = extract_inline_map(css);
        assert_eq!(stripped, ".a { }");
        assert!(matches!(extraction, MapExtraction::Invalid { .. }));
    }

    #[test]
    fn test_external_reference_is_left_alone() {
        let css = ".a { }\n/*# sourceMappingURL=custom.css.map */";
        let (out, extraction) = extract_inline_map(css);
        assert_eq!(out, css);
        assert!(matches!(extraction, MapExtraction::Absent));
    }

    #[test]
    fn test_external_map_reference_format() {
        assert_eq!(
            external_map_reference("custom.css.map"),
            "/*# sourceMappingURL=custom.css.map */"
        );
    }

    #[test]
    fn test_rewrite_sources_to_public_urls() {
        let mut doc = SourceMapDocument::new(
            "custom.css",
            vec![
                "/srv/themes/base/scss/custom.scss".to_string(),
                "/srv/themes/base/scss/_colors.scss".to_string(),
            ],
        );

        rewrite_sources(&mut doc, |physical| {
            physical
                .strip_prefix("/srv/themes/base/")
                .map(|rel| format!("/media/theme/{}", rel))
        });

        assert_eq!(doc.sources[0], "/media/theme/scss/custom.scss");
        assert_eq!(doc.sources[1], "/media/theme/scss/_colors.scss");
    }

    #[test]
    fn test_rewrite_falls_back_to_basename() {
        let mut doc =
            SourceMapDocument::new("custom.css", vec!["/outside/of/roots/x.scss".to_string()]);
        rewrite_sources(&mut doc, |_| None);
        assert_eq!(doc.sources, vec!["x.scss"]);
        assert!(!doc.sources[0].contains('/'), "no filesystem segments leak");
    }
}
