//! Platform-specific durable sync primitives
//!
//! Two sync points matter for the atomic-replace commit:
//!
//! 1. The temp file's data must be on persistent media BEFORE the rename,
//!    or a crash can promote a file whose contents are still in cache.
//! 2. The parent directory entry must be synced AFTER the rename, or a
//!    crash can lose the rename itself and resurface the old file.
//!
//! Each platform exposes a different strongest primitive for (1); this
//! module maps to it.

use std::fs::File;
use std::io;
use std::path::Path;

/// Ensure a file's data has reached persistent storage before returning.
///
/// Platform behaviors:
/// - Linux: fdatasync() - syncs data but not metadata (faster than fsync)
/// - macOS/iOS: fcntl(F_FULLFSYNC) - bypasses the disk write cache
/// - elsewhere (incl. Windows): File::sync_data(), which maps to the
///   platform sync call (FlushFileBuffers on Windows)
///
/// May block for the duration of the device flush; the caller must not
/// hold locks that concurrent readers need.
pub fn sync_file(file: &File) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: fdatasync operates on the fd of an open File borrowed
        // for the duration of the call.
        let rc = unsafe { libc::fdatasync(file.as_raw_fd()) };
        if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        use std::os::unix::io::AsRawFd;
        // fsync() on Apple platforms only reaches the disk's volatile
        // write cache; F_FULLFSYNC is the durable variant.
        // SAFETY: fcntl operates on the fd of an open File borrowed for
        // the duration of the call.
        let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_FULLFSYNC) };
        if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "ios")))]
    {
        file.sync_data()
    }
}

/// Sync the directory containing `path`, making a completed rename durable.
///
/// On unix a rename mutates the parent directory, which has its own cache
/// entry; opening the directory and fsyncing it is the documented way to
/// persist the name change. On Windows directory handles cannot be fsynced
/// this way and the rename is made durable by the filesystem, so this is a
/// no-op.
pub fn sync_parent_dir(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let dir = File::open(parent)?;
        dir.sync_data()
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}
