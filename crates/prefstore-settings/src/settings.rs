//! The persisted settings value
//!
//! A flat record of independently settable fields. Every field carries
//! `#[serde(default)]` so that files written by older builds — or by a
//! build that did not know a field yet — load cleanly with the missing
//! fields at their defaults. That per-field defaulting is the whole
//! versioning story; there is no header or migration table.

use serde::{Deserialize, Serialize};

fn default_model() -> String {
    "default".to_string()
}

/// Application settings persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// API key for the transcription backend; empty until the user sets one
    #[serde(default)]
    pub api_key: String,

    /// Selected transcription model identifier
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
        }
    }
}
