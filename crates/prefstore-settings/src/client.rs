//! Typed settings client
//!
//! `SettingsClient` is the handle application code holds: construct one
//! during startup with the settings directory, then pass clones to
//! whatever needs settings access. There is deliberately no global
//! instance — lifecycle belongs to the startup sequence, not to
//! first-use magic.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use prefstore_core::{PrefResult, PrefStore, Snapshot, Subscription};

use crate::settings::AppSettings;

/// File name of the settings document inside the settings directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Shared handle to the application's settings store.
///
/// Cloning is cheap and every clone observes the same store. All methods
/// take `&self`; concurrency is handled by the underlying `PrefStore`.
#[derive(Clone)]
pub struct SettingsClient {
    store: Arc<PrefStore<AppSettings>>,
}

impl std::fmt::Debug for SettingsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsClient").finish_non_exhaustive()
    }
}

impl SettingsClient {
    /// Open the settings store at `dir/settings.json`.
    ///
    /// `dir` must exist and be writable. A missing settings file means
    /// first run: defaults are used and no file is created until the
    /// first change. A corrupt file fails the open — use
    /// `open_in_or_default` for the reset-and-continue policy.
    pub fn open_in<P: AsRef<Path>>(dir: P) -> PrefResult<Self> {
        let store = PrefStore::open(dir.as_ref().join(SETTINGS_FILE))?;
        Ok(Self { store: Arc::new(store) })
    }

    /// Open like `open_in`, but recover from a corrupt settings file by
    /// starting from defaults (logged, and the file is only replaced on
    /// the next successful change).
    pub fn open_in_or_default<P: AsRef<Path>>(dir: P) -> PrefResult<Self> {
        let store = PrefStore::open_or_default(dir.as_ref().join(SETTINGS_FILE))?;
        Ok(Self { store: Arc::new(store) })
    }

    /// Current settings. Synchronous, served from memory.
    pub fn settings(&self) -> AppSettings {
        self.store.current()
    }

    /// Replace the whole settings record.
    pub fn replace(&self, settings: AppSettings) -> PrefResult<()> {
        self.store.replace(settings).map(|_| ())
    }

    /// Modify the settings through a closure; the read-modify-write is
    /// atomic against concurrent changes.
    pub fn update(&self, mutate: impl FnOnce(&mut AppSettings)) -> PrefResult<AppSettings> {
        self.store.update(mutate).map(|snap| snap.value)
    }

    /// Current API key.
    pub fn api_key(&self) -> String {
        self.store.current().api_key
    }

    /// Persist a new API key, leaving the other fields untouched.
    pub fn set_api_key(&self, api_key: impl Into<String>) -> PrefResult<()> {
        let api_key = api_key.into();
        self.store.update(|s| s.api_key = api_key).map(|_| ())
    }

    /// Current model identifier.
    pub fn model(&self) -> String {
        self.store.current().model
    }

    /// Persist a new model selection, leaving the other fields untouched.
    pub fn set_model(&self, model: impl Into<String>) -> PrefResult<()> {
        let model = model.into();
        self.store.update(|s| s.model = model).map(|_| ())
    }

    /// Watch for settings changes.
    ///
    /// Returns the subscription and the settings current at registration;
    /// every later committed change arrives in order on the subscription.
    pub fn watch(&self) -> (Subscription<AppSettings>, AppSettings) {
        self.store.subscribe()
    }

    /// Settings plus revision, for staleness diagnostics.
    pub fn snapshot(&self) -> Snapshot<AppSettings> {
        self.store.snapshot()
    }

    /// Path of the settings file.
    pub fn path(&self) -> PathBuf {
        self.store.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clones_share_one_store() {
        let dir = TempDir::new().unwrap();
        let client = SettingsClient::open_in(dir.path()).unwrap();
        let clone = client.clone();

        client.set_model("tiny").unwrap();
        assert_eq!(clone.model(), "tiny");
    }

    #[test]
    fn test_field_setters_do_not_touch_other_fields() {
        let dir = TempDir::new().unwrap();
        let client = SettingsClient::open_in(dir.path()).unwrap();

        client.set_api_key("sk-123").unwrap();
        client.set_model("large").unwrap();

        let settings = client.settings();
        assert_eq!(settings.api_key, "sk-123");
        assert_eq!(settings.model, "large");
    }

    #[test]
    fn test_path_layout() {
        let dir = TempDir::new().unwrap();
        let client = SettingsClient::open_in(dir.path()).unwrap();
        assert_eq!(client.path(), dir.path().join(SETTINGS_FILE));
    }
}
