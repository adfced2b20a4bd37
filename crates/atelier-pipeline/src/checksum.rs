//! Checksums and compile metadata.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! A checksum is computed over the final rendered output, not the raw
//! sources: any input change that alters output content invalidates the
//! cache, and a no-op rebuild self-identifies as unchanged. Production
//! artifacts additionally embed their body checksum as a stable first-line
//! comment so the serving layer can compare without opening the metadata
//! record.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::write::atomic_write;

/// First line of a production artifact, e.g.
/// `/*# checksum=sha256:9f86d08... */`.
static CHECKSUM_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/\*# checksum=(sha256:[0-9a-f]{64}) \*/").unwrap());

/// A `sha256:`-prefixed content checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    pub const PREFIX: &'static str = "sha256:";

    /// Wrap a raw hash string, adding the prefix when missing.
    pub fn new(raw: &str) -> Self {
        if raw.starts_with(Self::PREFIX) {
            Self(raw.to_string())
        } else {
            Self(format!("{}{}", Self::PREFIX, raw))
        }
    }

    /// Compute the checksum of a byte sequence.
    pub fn from_bytes(content: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(content);
        Self(format!("{}{:x}", Self::PREFIX, hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex digest without the prefix.
    pub fn hex(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }

    /// Render the embedded first-line comment for production output.
    pub fn embedded_line(&self) -> String {
        format!("/*# checksum={} */", self.0)
    }

    /// Parse the embedded checksum line from previously written output.
    pub fn parse_embedded(css: &str) -> Option<Self> {
        CHECKSUM_LINE
            .captures(css)
            .map(|captures| Self(captures[1].to_string()))
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata persisted alongside an artifact after a successful compile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Checksum of the written artifact bytes
    pub checksum: Checksum,
    /// When the artifact was written
    pub timestamp: DateTime<Utc>,
    /// Compiler variant that produced it (e.g. `scss`)
    pub compiler: String,
}

impl MetadataRecord {
    pub fn new(checksum: Checksum, compiler: impl Into<String>) -> Self {
        Self {
            checksum,
            timestamp: Utc::now(),
            compiler: compiler.into(),
        }
    }
}

/// Persistence for metadata records, stored as `<artifact>.meta.json`.
pub struct MetadataStore;

impl MetadataStore {
    /// Path of the record belonging to `artifact`.
    pub fn record_path(artifact: &Path) -> PathBuf {
        let mut name = artifact.file_name().unwrap_or_default().to_os_string();
        name.push(".meta.json");
        artifact.with_file_name(name)
    }

    /// Load the record for `artifact`.
    ///
    /// A missing or unreadable record is treated as "never compiled";
    /// corruption is logged and also falls back to `None`.
    pub fn load(artifact: &Path) -> Option<MetadataRecord> {
        let path = Self::record_path(artifact);
        let bytes = std::fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt metadata record");
                None
            }
        }
    }

    /// Atomically persist the record for `artifact`.
    pub fn record(artifact: &Path, record: &MetadataRecord) -> Result<(), crate::BuildError> {
        let bytes = serde_json::to_vec_pretty(record)?;
        atomic_write(&Self::record_path(artifact), &bytes)?;
        Ok(())
    }

    /// Decide whether `artifact` must be rebuilt for `current` content.
    ///
    /// True when no record exists or the recorded checksum differs.
    pub fn should_recompile(artifact: &Path, current: &Checksum) -> bool {
        match Self::load(artifact) {
            Some(record) => record.checksum != *current,
            None => true,
        }
    }
}
