//! Application settings over PrefStore
//!
//! Binds the generic reactive persisted value store to the application's
//! concrete settings record.
//!
//! # Architecture
//!
//! - `AppSettings` is the persisted value: a flat record whose fields all
//!   default independently, so the file format evolves by adding fields.
//! - `SettingsClient` is the handle UI/glue code talks to: read, replace,
//!   single-field setters, and change watching. It is constructed
//!   explicitly with a settings directory and shared by cloning — no
//!   ambient global lookup.

pub mod client;
pub mod settings;

pub use client::{SettingsClient, SETTINGS_FILE};
pub use settings::AppSettings;
