//! Crash-safe single-file persistence
//!
//! `DurableFile` owns one target path and rewrites it atomically. Each
//! write replaces the complete file content; there is no append path.
//!
//! COMMIT ORDERING — every step must happen in this exact order:
//!
//! 1. write:  full content to a temp sibling in the same directory
//! 2. sync:   sync_file() so the temp's bytes reach persistent media
//! 3. rename: atomic replace of the target path with the temp
//! 4. sync:   sync_parent_dir() so the rename itself survives a crash
//!
//! A reader never observes a half-written target: until step 3 the old
//! file is intact, and step 3 is atomic on the platforms we support. A
//! crash before step 3 leaves at worst a stale temp sibling, which
//! `remove_stale_temps` clears on the next open.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::durability::{sync_file, sync_parent_dir};
use crate::error::{PrefError, PrefResult};

/// Suffix marking in-flight temp siblings, e.g. `settings.json.tmp-1234-0`.
const TEMP_MARKER: &str = ".tmp-";

/// Process-wide counter so concurrent writers targeting different paths
/// never collide on a temp name.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Handle for atomic whole-file replacement of one target path.
///
/// CRITICAL INVARIANT: `write_atomic` must complete (including both sync
/// points) BEFORE the caller updates any in-memory state. The store facade
/// enforces this by holding its writer mutex across the call.
pub struct DurableFile {
    /// Target path of the persisted value
    path: PathBuf,
}

impl DurableFile {
    /// Create a handle for the given target path. Does not touch the
    /// filesystem — the file appears on the first `write_atomic`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Target path this handle writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full current content of the target file.
    ///
    /// `Ok(None)` means the file does not exist — the normal first-run
    /// condition, distinct from every other I/O failure so the caller can
    /// fall back to defaults instead of treating it as corruption.
    pub fn read(&self) -> PrefResult<Option<Vec<u8>>> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PrefError::io_at(&self.path, e, "Failed to open value file")),
        };

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| PrefError::io_at(&self.path, e, "Failed to read value file"))?;
        Ok(Some(bytes))
    }

    /// Atomically replace the target file's content with `bytes`.
    ///
    /// On any failure the previous target content is left intact; a failed
    /// attempt's temp sibling is deleted best-effort before returning.
    pub fn write_atomic(&mut self, bytes: &[u8]) -> PrefResult<()> {
        let temp_path = self.temp_sibling();

        let result = self.write_via_temp(&temp_path, bytes);
        if result.is_err() {
            // Leave no half-written temp behind on the failure path.
            let _ = std::fs::remove_file(&temp_path);
        }
        result
    }

    fn write_via_temp(&self, temp_path: &Path, bytes: &[u8]) -> PrefResult<()> {
        // Step 1: full content into the temp sibling
        let mut temp = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp_path)
            .map_err(|e| PrefError::io_at(temp_path, e, "Failed to create temp file"))?;

        temp.write_all(bytes)
            .map_err(|e| PrefError::io_at(temp_path, e, "Failed to write temp file"))?;

        // Step 2: temp bytes must be durable before the rename can
        // legitimately promote them
        sync_file(&temp)
            .map_err(|e| PrefError::io_at(temp_path, e, "Failed to sync temp file"))?;
        drop(temp);

        // Step 3: atomic replace of the target
        std::fs::rename(temp_path, &self.path)
            .map_err(|e| PrefError::io_at(&self.path, e, "Failed to rename temp over target"))?;

        // Step 4: persist the rename itself
        sync_parent_dir(&self.path)
            .map_err(|e| PrefError::io_at(&self.path, e, "Failed to sync parent directory"))?;

        Ok(())
    }

    /// Delete temp siblings left behind by crashed writes.
    ///
    /// Returns the number of files removed. Failures to list or delete are
    /// ignored — stale temps are garbage, not state, and the next write
    /// does not depend on their absence.
    pub fn remove_stale_temps(&self) -> usize {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let prefix = match self.path.file_name().and_then(|n| n.to_str()) {
            Some(name) => format!("{}{}", name, TEMP_MARKER),
            None => return 0,
        };

        let entries = match std::fs::read_dir(parent) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) && std::fs::remove_file(entry.path()).is_ok() {
                debug!(temp = name, "removed stale temp file");
                removed += 1;
            }
        }
        removed
    }

    /// Temp sibling path unique to this process and write attempt.
    fn temp_sibling(&self) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("value");
        self.path
            .with_file_name(format!("{}{}{}-{}", name, TEMP_MARKER, process::id(), seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn durable(dir: &TempDir) -> DurableFile {
        DurableFile::new(dir.path().join("value.json"))
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let file = durable(&dir);
        assert_eq!(file.read().unwrap(), None);
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut file = durable(&dir);

        file.write_atomic(b"{\"a\":1}").unwrap();
        assert_eq!(file.read().unwrap(), Some(b"{\"a\":1}".to_vec()));
    }

    #[test]
    fn test_write_replaces_whole_content() {
        let dir = TempDir::new().unwrap();
        let mut file = durable(&dir);

        file.write_atomic(b"first version, long content").unwrap();
        file.write_atomic(b"second").unwrap();
        assert_eq!(file.read().unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_write_leaves_no_temp_behind() {
        let dir = TempDir::new().unwrap();
        let mut file = durable(&dir);
        file.write_atomic(b"content").unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().map_or(false, |n| n.contains(TEMP_MARKER)))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);
    }

    #[test]
    fn test_write_fails_cleanly_without_parent_dir() {
        let dir = TempDir::new().unwrap();
        let mut file = DurableFile::new(dir.path().join("missing").join("value.json"));

        let err = file.write_atomic(b"never lands").unwrap_err();
        match err {
            PrefError::Io { kind, path, .. } => {
                assert_eq!(kind, std::io::ErrorKind::NotFound);
                assert!(path.is_some());
            }
            other => panic!("Expected Io error, got {:?}", other),
        }
        // Reading the same path is the normal first-run condition.
        assert_eq!(file.read().unwrap(), None);
    }

    #[test]
    fn test_stale_temp_cleanup() {
        let dir = TempDir::new().unwrap();
        let file = durable(&dir);

        // Simulate a crash mid-write: a temp sibling with partial bytes.
        std::fs::write(dir.path().join("value.json.tmp-9999-0"), b"{\"trunc").unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), b"keep me").unwrap();

        assert_eq!(file.remove_stale_temps(), 1);
        assert!(dir.path().join("unrelated.txt").exists());
        // Target still absent — the partial write never became visible.
        assert_eq!(file.read().unwrap(), None);
    }

    #[test]
    fn test_crash_simulation_old_content_intact() {
        let dir = TempDir::new().unwrap();
        let mut file = durable(&dir);
        file.write_atomic(b"committed v1").unwrap();

        // Crash after temp write, before rename: temp exists, target old.
        std::fs::write(dir.path().join("value.json.tmp-4242-7"), b"half of v2").unwrap();

        assert_eq!(file.read().unwrap(), Some(b"committed v1".to_vec()));
        assert_eq!(file.remove_stale_temps(), 1);
        assert_eq!(file.read().unwrap(), Some(b"committed v1".to_vec()));
    }

    #[test]
    fn test_temp_names_unique() {
        let dir = TempDir::new().unwrap();
        let file = durable(&dir);
        let a = file.temp_sibling();
        let b = file.temp_sibling();
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(dir.path()));
    }
}
