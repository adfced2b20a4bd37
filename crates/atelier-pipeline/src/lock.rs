//! Cooperative file locking for output artifacts.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! Coordination across concurrent compiles of the same artifact happens
//! purely through an advisory OS lock on a sibling `.lock` file; it works
//! across independent processes sharing a filesystem, with no in-memory
//! synchronization. Acquisition is non-blocking: contention is a normal
//! outcome, not an error, and the caller falls back to serving the
//! previously built artifact.
//!
//! The lock file itself is left in place after release; only the OS lock is
//! dropped. Removing it would open a window where two processes hold locks
//! on different inodes of the same path.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

/// Result of a non-blocking lock attempt.
#[derive(Debug)]
pub enum LockAttempt {
    /// The lock was acquired; held until the guard is dropped
    Locked(LockGuard),
    /// Another process holds the lock
    Contended,
}

/// Exclusive lock on an artifact, keyed by its physical output path.
pub struct ArtifactLock;

impl ArtifactLock {
    /// Attempt to acquire the lock for `artifact` without blocking.
    ///
    /// Errors are real filesystem failures (unwritable directory, etc.);
    /// contention is reported through `LockAttempt::Contended`.
    pub fn acquire(artifact: &Path) -> io::Result<LockAttempt> {
        let lock_path = lock_path(artifact);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&lock_path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(LockAttempt::Locked(LockGuard {
                _file: file,
                path: lock_path,
            })),
            Err(e) if is_contended(&e) => {
                tracing::debug!(path = %lock_path.display(), "artifact lock contended");
                Ok(LockAttempt::Contended)
            }
            Err(e) => Err(e),
        }
    }
}

/// RAII guard for a held artifact lock.
///
/// Releases on drop, which covers every exit path of a compile, including
/// error propagation and unwinds.
pub struct LockGuard {
    _file: File,
    path: PathBuf,
}

impl LockGuard {
    /// The path of the lock file backing this guard.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // Best effort; the lock is released by the OS when the file handle
        // closes even if the explicit unlock fails.
        let _ = fs2::FileExt::unlock(&self._file);
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("path", &self.path).finish()
    }
}

fn lock_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    artifact.with_file_name(name)
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("custom.css");

        let first = ArtifactLock::acquire(&artifact).unwrap();
        let guard = match first {
            LockAttempt::Locked(guard) => guard,
            LockAttempt::Contended => panic!("fresh lock should not be contended"),
        };

        // A second attempt in the same process observes contention.
        assert!(matches!(
            ArtifactLock::acquire(&artifact).unwrap(),
            LockAttempt::Contended
        ));

        drop(guard);

        // Released on drop; acquirable again.
        assert!(matches!(
            ArtifactLock::acquire(&artifact).unwrap(),
            LockAttempt::Locked(_)
        ));
    }

    #[test]
    fn test_lock_file_is_a_sibling() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("out/custom.css");

        let attempt = ArtifactLock::acquire(&artifact).unwrap();
        let LockAttempt::Locked(guard) = attempt else {
            panic!("expected lock");
        };
        assert_eq!(guard.path(), dir.path().join("out/custom.css.lock"));
        assert!(guard.path().exists());
    }

    #[test]
    fn test_distinct_artifacts_do_not_contend() {
        let dir = TempDir::new().unwrap();
        let a = ArtifactLock::acquire(&dir.path().join("a.css")).unwrap();
        let b = ArtifactLock::acquire(&dir.path().join("b.css")).unwrap();
        assert!(matches!(a, LockAttempt::Locked(_)));
        assert!(matches!(b, LockAttempt::Locked(_)));
    }

    #[test]
    fn test_release_survives_panic() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("custom.css");

        let result = std::panic::catch_unwind(|| {
            let _guard = match ArtifactLock::acquire(&artifact).unwrap() {
                LockAttempt::Locked(guard) => guard,
                LockAttempt::Contended => panic!("unexpected contention"),
            };
            panic!("compile aborted");
        });
        assert!(result.is_err());

        assert!(matches!(
            ArtifactLock::acquire(&artifact).unwrap(),
            LockAttempt::Locked(_)
        ));
    }
}
