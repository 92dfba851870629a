//! Error types for PrefStore operations
//!
//! All store errors are represented by the PrefError enum, which carries
//! enough context (paths, underlying kinds, reasons) for callers to decide
//! recovery policy without string matching.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// PrefStore error types with detailed context
#[derive(Debug, Clone)]
pub enum PrefError {
    /// I/O operation failed
    Io {
        /// The file path where the error occurred
        path: Option<PathBuf>,
        /// The underlying I/O error kind
        kind: std::io::ErrorKind,
        /// Human-readable description
        message: String,
    },

    /// The persisted file exists but its bytes are not a valid encoding.
    ///
    /// This is the recoverable-corruption condition: it may indicate user
    /// data loss, so it is surfaced from `open` instead of being silently
    /// replaced with defaults. Missing or unknown individual fields are
    /// NOT corruption — they are filled from defaults by the codec.
    Corrupt {
        /// Path to the undecodable file
        path: PathBuf,
        /// Parser description of what was malformed
        reason: String,
    },

    /// A value failed to serialize.
    ///
    /// Not expected for well-formed value types; kept as an error rather
    /// than a panic so mutation paths stay total.
    Encode {
        /// Serializer description of the failure
        reason: String,
    },
}

impl fmt::Display for PrefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefError::Io { path, kind, message } => {
                if let Some(path) = path {
                    write!(f, "I/O error in {}: {} ({})", path.display(), message, kind)
                } else {
                    write!(f, "I/O error: {} ({})", message, kind)
                }
            }

            PrefError::Corrupt { path, reason } => {
                write!(f, "Corrupt value file {}: {}", path.display(), reason)
            }

            PrefError::Encode { reason } => {
                write!(f, "Failed to encode value: {}", reason)
            }
        }
    }
}

impl Error for PrefError {}

/// Convert std::io::Error to PrefError::Io
impl From<std::io::Error> for PrefError {
    fn from(err: std::io::Error) -> Self {
        PrefError::Io {
            path: None,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl PrefError {
    /// Attach a path to an I/O error produced without one.
    pub(crate) fn io_at(path: &std::path::Path, err: std::io::Error, what: &str) -> Self {
        PrefError::Io {
            path: Some(path.to_path_buf()),
            kind: err.kind(),
            message: format!("{}: {}", what, err),
        }
    }

    /// True for the recoverable-corruption condition.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, PrefError::Corrupt { .. })
    }
}

/// Result type alias for PrefStore operations
pub type PrefResult<T> = Result<T, PrefError>;
