//! Byte-oriented key-value storage.
//!
//! [`KVStore`] is the seam every namecast component persists through: span
//! metadata for projects and cached bandwidth samples for sessions. Three
//! pieces are provided:
//!
//! - [`MemoryStore`], process-local and ordered, for tests and one-shot runs
//! - [`RedbStore`], a single-file database that survives restarts
//! - [`ExpiringStore`], which stamps entries with an absolute deadline read
//!   from a [`Clock`] so expiry is explicit and testable

pub mod expiring;
pub mod memory;
pub mod redb;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KVError {
    /// The backing store failed (I/O, transaction, poisoned lock).
    #[error("kv: storage error: {0}")]
    Storage(String),

    /// A stored value could not be encoded or decoded.
    #[error("kv: serialization error: {0}")]
    Serialization(String),
}

pub type KVResult<T> = Result<T, KVError>;

/// Thread-safe key-value store with string keys and opaque byte values.
///
/// Implementations must make [`KVStore::compare_and_swap`] and
/// [`KVStore::compare_and_delete`] atomic with respect to every other
/// operation on the same key; higher layers build versioned writes on them.
pub trait KVStore: Send + Sync {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>>;

    /// Stores `value`, replacing any previous one.
    fn set(&self, key: &str, value: &[u8]) -> KVResult<()>;

    /// Removes `key`. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> KVResult<()>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>>;

    /// Writes `new` only if the current value equals `expected`, where
    /// `None` means the key must be absent. Returns whether the write
    /// happened.
    fn compare_and_swap(&self, key: &str, expected: Option<&[u8]>, new: &[u8]) -> KVResult<bool>;

    /// Removes `key` only if its current value equals `expected`. Returns
    /// whether the entry was removed.
    fn compare_and_delete(&self, key: &str, expected: &[u8]) -> KVResult<bool>;
}

pub use expiring::{Clock, ExpiringStore, ManualClock, SystemClock};
pub use memory::MemoryStore;
pub use redb::RedbStore;
