//! Time-to-live layer over a [`KVStore`].
//!
//! Every entry is written together with its deadline. The deadline is checked
//! on read: an entry past its deadline is reported as absent and removed,
//! unless a writer replaced it in the meantime.
//! There is no background sweeper, so expiry depends only on the injected
//! [`Clock`], which keeps tests deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{KVError, KVResult, KVStore};

/// Source of the current time in milliseconds.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary but fixed epoch.
    fn now_millis(&self) -> u64;
}

/// Wall clock based on [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

const DEADLINE_LEN: usize = 8;

/// A [`KVStore`] wrapper where every value carries an explicit expiry.
#[derive(Clone)]
pub struct ExpiringStore {
    store: Arc<dyn KVStore>,
    clock: Arc<dyn Clock>,
}

impl ExpiringStore {
    pub fn new(store: Arc<dyn KVStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Stores `value` under `key`, valid for `ttl` from now.
    pub fn set(&self, key: &str, value: &[u8], ttl: Duration) -> KVResult<()> {
        let deadline = self
            .clock
            .now_millis()
            .saturating_add(ttl.as_millis() as u64);
        let mut buf = Vec::with_capacity(DEADLINE_LEN + value.len());
        buf.extend_from_slice(&deadline.to_be_bytes());
        buf.extend_from_slice(value);
        self.store.set(key, &buf)
    }

    /// Returns the value if present and not yet expired.
    pub fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        let (deadline, value) = split_entry(&raw)?;
        if self.clock.now_millis() >= deadline {
            self.store.compare_and_delete(key, &raw)?;
            return Ok(None);
        }
        Ok(Some(value.to_vec()))
    }

    /// Drops the entry immediately.
    pub fn expire(&self, key: &str) -> KVResult<()> {
        self.store.delete(key)
    }

    /// Time left before the entry expires, if it is still live.
    pub fn remaining(&self, key: &str) -> KVResult<Option<Duration>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        let (deadline, _) = split_entry(&raw)?;
        let now = self.clock.now_millis();
        if now >= deadline {
            return Ok(None);
        }
        Ok(Some(Duration::from_millis(deadline - now)))
    }

    /// Stores a JSON-encoded value.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> KVResult<()> {
        let data = serde_json::to_vec(value).map_err(|e| KVError::Serialization(e.to_string()))?;
        self.set(key, &data, ttl)
    }

    /// Reads and decodes a JSON value if present and live.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> KVResult<Option<T>> {
        match self.get(key)? {
            Some(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| KVError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }
}

fn split_entry(raw: &[u8]) -> KVResult<(u64, &[u8])> {
    if raw.len() < DEADLINE_LEN {
        return Err(KVError::Serialization(format!(
            "expiring entry too short: {} bytes",
            raw.len()
        )));
    }
    let (head, value) = raw.split_at(DEADLINE_LEN);
    let mut deadline = [0u8; DEADLINE_LEN];
    deadline.copy_from_slice(head);
    Ok((u64::from_be_bytes(deadline), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::Mutex;

    fn store_with_clock() -> (ExpiringStore, Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::new(1_000));
        let backing = MemoryStore::new();
        let store = ExpiringStore::new(Arc::new(backing.clone()), clock.clone());
        (store, clock, backing)
    }

    #[test]
    fn test_entry_live_until_deadline() {
        let (store, clock, _) = store_with_clock();
        store.set("s", b"v", Duration::from_secs(60)).unwrap();

        clock.advance(Duration::from_secs(59));
        assert_eq!(store.get("s").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.remaining("s").unwrap(), Some(Duration::from_secs(1)));

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get("s").unwrap(), None);
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let (store, clock, backing) = store_with_clock();
        store.set("s", b"v", Duration::from_millis(10)).unwrap();
        clock.advance(Duration::from_millis(10));

        assert_eq!(store.get("s").unwrap(), None);
        assert!(backing.is_empty());
    }

    /// Lets a writer land between a read and whatever follows it.
    struct InterleavedWriter {
        inner: MemoryStore,
        pending: Mutex<Option<(String, Vec<u8>)>>,
    }

    impl KVStore for InterleavedWriter {
        fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
            let value = self.inner.get(key)?;
            if let Some((k, v)) = self.pending.lock().unwrap().take() {
                self.inner.set(&k, &v)?;
            }
            Ok(value)
        }

        fn set(&self, key: &str, value: &[u8]) -> KVResult<()> {
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> KVResult<()> {
            self.inner.delete(key)
        }

        fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
            self.inner.scan(prefix)
        }

        fn compare_and_swap(&self, key: &str, expected: Option<&[u8]>, new: &[u8]) -> KVResult<bool> {
            self.inner.compare_and_swap(key, expected, new)
        }

        fn compare_and_delete(&self, key: &str, expected: &[u8]) -> KVResult<bool> {
            self.inner.compare_and_delete(key, expected)
        }
    }

    #[test]
    fn test_expired_read_keeps_fresh_write() {
        let clock = Arc::new(ManualClock::new(1_000));
        let backing = Arc::new(InterleavedWriter {
            inner: MemoryStore::new(),
            pending: Mutex::new(None),
        });
        let store = ExpiringStore::new(backing.clone(), clock.clone());

        store.set("s", b"old", Duration::from_millis(10)).unwrap();
        clock.advance(Duration::from_millis(10));

        // The fresh entry is written after the stale one was read.
        let fresh_deadline = clock.now_millis() + 60_000;
        let mut fresh = fresh_deadline.to_be_bytes().to_vec();
        fresh.extend_from_slice(b"new");
        *backing.pending.lock().unwrap() = Some(("s".to_string(), fresh));

        assert_eq!(store.get("s").unwrap(), None);
        assert_eq!(store.get("s").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_expire_and_json() {
        let (store, _, _) = store_with_clock();
        store
            .set_json("n", &vec![1u32, 2, 3], Duration::from_secs(5))
            .unwrap();
        assert_eq!(store.get_json::<Vec<u32>>("n").unwrap(), Some(vec![1, 2, 3]));

        store.expire("n").unwrap();
        assert_eq!(store.get_json::<Vec<u32>>("n").unwrap(), None);
    }

    #[test]
    fn test_corrupt_entry() {
        let (store, _, backing) = store_with_clock();
        backing.set("bad", b"abc").unwrap();
        assert!(matches!(store.get("bad"), Err(KVError::Serialization(_))));
    }
}
