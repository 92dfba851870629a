//! Store facade — the single public entry point
//!
//! `PrefStore` combines the codec, the durable file, the value cache and
//! the change bus, and owns the concurrency discipline that ties them
//! together.
//!
//! **Read path**: cache only (sub-microsecond via RwLock), never disk.
//! **Write path**: durable file first, then cache, then fan-out.
//!
//! COMMIT ORDERING (the fundamental contract):
//! 1. Encode the new value
//! 2. Atomic durable write
//! 3. Cache advance + publish to subscribers
//!
//! If the durable write fails, neither cache nor subscribers ever see the
//! value. Mutations serialize through the `Mutex<DurableFile>`, making the
//! read-modify-write of `update` atomic end-to-end — two concurrent
//! updates of different fields cannot clobber each other.

use std::path::Path;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bus::{ChangeBus, Subscription};
use crate::cache::{Snapshot, ValueCache};
use crate::codec;
use crate::durable_file::DurableFile;
use crate::error::{PrefError, PrefResult};

/// Reactive persisted value store.
///
/// All public methods take `&self` for concurrent access. Readers go
/// through the cache RwLock; mutations serialize through the durable-file
/// Mutex and never hold the cache lock across I/O.
pub struct PrefStore<T> {
    /// Durable file — single writer via Mutex; holding this lock IS the
    /// writer-serialization discipline
    file: Mutex<DurableFile>,
    /// Last committed value — concurrent reads via RwLock
    cache: ValueCache<T>,
    /// Subscriber fan-out
    bus: ChangeBus<T>,
}

impl<T> std::fmt::Debug for PrefStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefStore").finish_non_exhaustive()
    }
}

impl<T> PrefStore<T>
where
    T: Clone + Default + Serialize + DeserializeOwned,
{
    /// Open a store backed by the file at `path`.
    ///
    /// A missing file is the normal first-run condition: the store starts
    /// from `T::default()` and writes nothing until the first mutation, so
    /// pure reads never create a file. An existing but undecodable file
    /// surfaces as `PrefError::Corrupt` — the caller decides whether to
    /// halt or reset (see `open_or_default`). Stale temp files from
    /// crashed writes are cleaned up here.
    pub fn open<P: AsRef<Path>>(path: P) -> PrefResult<Self> {
        let file = DurableFile::new(path);

        let removed = file.remove_stale_temps();
        if removed > 0 {
            info!(
                path = %file.path().display(),
                removed,
                "cleaned up temp files from interrupted writes"
            );
        }

        let initial = match file.read()? {
            Some(bytes) => {
                let value = codec::decode(file.path(), &bytes)?;
                info!(path = %file.path().display(), "loaded persisted value");
                value
            }
            None => {
                debug!(path = %file.path().display(), "no persisted value, starting from defaults");
                T::default()
            }
        };

        Ok(Self {
            file: Mutex::new(file),
            cache: ValueCache::new(initial),
            bus: ChangeBus::new(),
        })
    }

    /// Open like `open`, but recover from corruption by starting from
    /// defaults.
    ///
    /// The reset-and-continue policy: corruption is logged, the in-memory
    /// state becomes `T::default()`, and the corrupt file is left on disk
    /// untouched until the next successful mutation replaces it. Other
    /// I/O errors still fail the open.
    pub fn open_or_default<P: AsRef<Path>>(path: P) -> PrefResult<Self> {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => Ok(store),
            Err(PrefError::Corrupt { path, reason }) => {
                warn!(
                    path = %path.display(),
                    reason = %reason,
                    "persisted value is corrupt, continuing with defaults"
                );
                Ok(Self {
                    file: Mutex::new(DurableFile::new(path)),
                    cache: ValueCache::new(T::default()),
                    bus: ChangeBus::new(),
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Clone of the current value. O(1), never touches disk.
    pub fn current(&self) -> T {
        self.cache.get()
    }

    /// Current value together with its revision.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.cache.snapshot()
    }

    /// Revision of the current value. 0 until the first mutation commits.
    pub fn revision(&self) -> u64 {
        self.cache.revision()
    }

    /// Path of the backing file.
    pub fn path(&self) -> std::path::PathBuf {
        self.file.lock().path().to_path_buf()
    }

    /// Replace the whole value.
    ///
    /// Durably persists `value`, then makes it visible to readers and
    /// subscribers. On failure the previous value stays authoritative
    /// everywhere: on disk, in the cache, and for subscribers.
    pub fn replace(&self, value: T) -> PrefResult<Snapshot<T>> {
        let mut file = self.file.lock();
        self.commit_locked(&mut file, value)
    }

    /// Modify the value through a closure, persisting the result.
    ///
    /// The read of the current value and the write of the modified value
    /// happen under one writer lock: concurrent `update` calls touching
    /// different fields both take effect, regardless of interleaving.
    /// Returns the committed snapshot.
    pub fn update(&self, mutate: impl FnOnce(&mut T)) -> PrefResult<Snapshot<T>> {
        let mut file = self.file.lock();
        let mut value = self.cache.get();
        mutate(&mut value);
        self.commit_locked(&mut file, value)
    }

    /// Register a subscriber.
    ///
    /// Returns the subscription plus the value current at registration
    /// time; every later commit arrives as a discrete notification in
    /// commit order, with no update skipped or duplicated around the
    /// registration boundary.
    pub fn subscribe(&self) -> (Subscription<T>, T) {
        let (subscription, initial) = self.bus.subscribe_with(|| self.cache.snapshot());
        (subscription, initial.value)
    }

    /// Number of live subscribers. Diagnostic.
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Commit `value` while holding the writer lock.
    ///
    /// The cache advance and the fan-out run as one step under the bus
    /// registry lock, after the durable write succeeded. Fan-out is
    /// enqueue-only, so no subscriber can stall the writer.
    fn commit_locked(&self, file: &mut DurableFile, value: T) -> PrefResult<Snapshot<T>> {
        let bytes = codec::encode(&value)?;
        file.write_atomic(&bytes)?;
        Ok(self.bus.publish_with(|| self.cache.advance(value)))
    }
}
