//! Process-local store.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{KVError, KVResult, KVStore};

type Entries = BTreeMap<String, Vec<u8>>;

/// Ordered in-memory store. Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> KVResult<MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|_| KVError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KVStore for MemoryStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> KVResult<()> {
        self.lock()?.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> KVResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
        let entries = self.lock()?;
        let range = entries.range::<str, _>((Bound::Included(prefix), Bound::Unbounded));
        Ok(range
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&[u8]>, new: &[u8]) -> KVResult<bool> {
        let mut entries = self.lock()?;
        let current = entries.get(key).map(Vec::as_slice);
        if current != expected {
            return Ok(false);
        }
        entries.insert(key.to_owned(), new.to_vec());
        Ok(true)
    }

    fn compare_and_delete(&self, key: &str, expected: &[u8]) -> KVResult<bool> {
        let mut entries = self.lock()?;
        if entries.get(key).map(Vec::as_slice) != Some(expected) {
            return Ok(false);
        }
        entries.remove(key);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let store = MemoryStore::new();
        store.set("span:p1", b"a").unwrap();
        assert_eq!(store.get("span:p1").unwrap(), Some(b"a".to_vec()));
        assert_eq!(store.get("span:p2").unwrap(), None);

        store.delete("span:p1").unwrap();
        store.delete("span:p1").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_scan_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        store.set("span:b", b"2").unwrap();
        store.set("span:a", b"1").unwrap();
        store.set("spanx", b"x").unwrap();
        store.set("bw:s1", b"3").unwrap();

        let keys: Vec<String> = store.scan("span:").unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["span:a", "span:b"]);
        assert_eq!(store.scan("").unwrap().len(), 4);
    }

    #[test]
    fn test_compare_and_swap() {
        let store = MemoryStore::new();

        assert!(!store.compare_and_swap("k", Some(b"x"), b"v1").unwrap());
        assert!(store.compare_and_swap("k", None, b"v1").unwrap());
        assert!(!store.compare_and_swap("k", None, b"v2").unwrap());

        assert!(store.compare_and_swap("k", Some(b"v1"), b"v2").unwrap());
        assert_eq!(store.get("k").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_compare_and_delete() {
        let store = MemoryStore::new();
        assert!(!store.compare_and_delete("k", b"v1").unwrap());

        store.set("k", b"v2").unwrap();
        assert!(!store.compare_and_delete("k", b"v1").unwrap());
        assert_eq!(store.get("k").unwrap(), Some(b"v2".to_vec()));

        assert!(store.compare_and_delete("k", b"v2").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set("k", b"v").unwrap();
        assert_eq!(b.len(), 1);
    }
}
