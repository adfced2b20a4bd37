//! Atomic file persistence.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! Artifacts, map files and metadata records are written to a temporary
//! file in the destination directory and renamed into place, so concurrent
//! readers always observe either the previous complete file or the new one,
//! never a torn write.

use std::io::{self, Write as _};
use std::path::Path;

use tempfile::NamedTempFile;

/// Write `bytes` to `path` atomically (write-to-temp, then rename).
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.css");

        atomic_write(&path, b"first").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.css");
        atomic_write(&path, b"content").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
