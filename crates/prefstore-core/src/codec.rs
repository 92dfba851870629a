//! Encoding of stored values to and from the persisted file format
//!
//! The on-disk representation is a single pretty-printed JSON document of
//! the full value — not a diff or log. JSON is self-describing (field names
//! present), which is what makes the schema evolvable: a file written by an
//! older version simply lacks the newer fields, and those decode to their
//! defaults instead of failing.
//!
//! Decode fails only when the bytes are not valid JSON at all (truncated,
//! garbage, wrong file). Value types opt into per-field defaulting with
//! `#[serde(default)]`; unknown fields are ignored by serde.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::error::{PrefError, PrefResult};

/// Encode a value as pretty-printed JSON plus a trailing newline.
///
/// Never fails for a well-formed value type. The trailing newline keeps the
/// file friendly to text tooling; the decoder does not depend on it.
pub fn encode<T: Serialize>(value: &T) -> PrefResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| PrefError::Encode {
        reason: e.to_string(),
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a value from JSON bytes read from `path`.
///
/// `path` is used only for error context. Structurally malformed bytes
/// produce `PrefError::Corrupt`; missing fields are filled from the value
/// type's defaults.
pub fn decode<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> PrefResult<T> {
    serde_json::from_slice(bytes).map_err(|e| PrefError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
