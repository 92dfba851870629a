//! PrefStore Core — Reactive Persisted Value store
//!
//! A single typed value that is cached in RAM for synchronous reads,
//! durably persisted as one JSON file, and observable through an ordered
//! multicast change bus.
//!
//! # Architecture
//!
//! - **Read path**: serve the last committed value from the RAM cache
//! - **Write path**: atomic-replace file write first, then cache, then
//!   subscriber fan-out (commit-then-notify)
//! - **Subscriptions**: replay of the latest value at registration, then
//!   every committed update in order
//!
//! # No framework dependencies
//!
//! This crate knows nothing about UI toolkits or dependency-injection
//! containers. It holds one value of an application-defined type; typed
//! adapters live in separate crates (e.g. prefstore-settings).

pub mod bus;
pub mod cache;
pub mod codec;
pub mod durability;
pub mod durable_file;
pub mod error;
pub mod store;

// Re-export key types for convenience
pub use bus::{ChangeBus, Subscription};
pub use cache::{Snapshot, ValueCache};
pub use durable_file::DurableFile;
pub use error::{PrefError, PrefResult};
pub use store::PrefStore;
