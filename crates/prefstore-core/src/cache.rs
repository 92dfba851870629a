//! In-memory value cache
//!
//! The cache is the read surface: `get`/`snapshot` serve the last
//! committed value from RAM without I/O, concurrent via RwLock.
//! Only the store facade calls `advance`, and only after a durable
//! write has succeeded — never speculatively.

use parking_lot::RwLock;

/// One committed state: the value plus its revision.
///
/// The revision increments by exactly 1 per committed mutation. Delivery
/// is designed to be in order; the counter lets subscribers detect and
/// discard a stale notification if that design assumption is ever broken,
/// and gives tests a direct handle on the ordering invariant.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// The committed value
    pub value: T,
    /// Monotonic commit counter; 0 is the initial loaded-or-default state
    pub revision: u64,
}

/// Last-committed value behind an RwLock.
///
/// Reads take the lock's read side briefly to clone; writers never hold it
/// across I/O, so read latency is bounded by the clone, not the disk.
pub struct ValueCache<T> {
    current: RwLock<Snapshot<T>>,
}

impl<T: Clone> ValueCache<T> {
    /// Create a cache holding the initial state at revision 0.
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Snapshot { value, revision: 0 }),
        }
    }

    /// Clone of the last committed value. Synchronous, never touches disk.
    pub fn get(&self) -> T {
        self.current.read().value.clone()
    }

    /// Clone of the last committed state including its revision.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.current.read().clone()
    }

    /// Revision of the last committed state.
    pub fn revision(&self) -> u64 {
        self.current.read().revision
    }

    /// Install a newly committed value, bumping the revision.
    ///
    /// Called by the facade only after the durable write succeeded.
    /// Returns the new snapshot for publication.
    pub fn advance(&self, value: T) -> Snapshot<T> {
        let mut current = self.current.write();
        current.value = value;
        current.revision += 1;
        current.clone()
    }
}
