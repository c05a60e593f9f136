//! Single-file persistent store on redb.

use std::fmt::Display;
use std::path::Path;

use redb::{Database, ReadableTable, Table, TableDefinition};

use crate::{KVError, KVResult, KVStore};

const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

type EntriesTable<'txn> = Table<'txn, &'static str, &'static [u8]>;

fn storage<E: Display>(e: E) -> KVError {
    KVError::Storage(e.to_string())
}

/// Persistent store in one redb file.
///
/// redb serializes write transactions, so [`KVStore::compare_and_swap`] is
/// atomic for every handle on the file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Opens the database at `path`, creating file and table as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> KVResult<Self> {
        let store = Self {
            db: Database::create(path).map_err(storage)?,
        };
        store.write(|_| Ok(()))?;
        Ok(store)
    }

    /// Runs `op` inside one committed write transaction.
    fn write<T>(&self, op: impl FnOnce(&mut EntriesTable<'_>) -> KVResult<T>) -> KVResult<T> {
        let tx = self.db.begin_write().map_err(storage)?;
        let out = {
            let mut table = tx.open_table(ENTRIES).map_err(storage)?;
            op(&mut table)?
        };
        tx.commit().map_err(storage)?;
        Ok(out)
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(ENTRIES).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> KVResult<()> {
        self.write(|table| {
            table.insert(key, value).map_err(storage)?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> KVResult<()> {
        self.write(|table| {
            table.remove(key).map_err(storage)?;
            Ok(())
        })
    }

    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(ENTRIES).map_err(storage)?;

        let mut out = Vec::new();
        for entry in table.range(prefix..).map_err(storage)? {
            let (key, value) = entry.map_err(storage)?;
            if !key.value().starts_with(prefix) {
                break;
            }
            out.push((key.value().to_owned(), value.value().to_vec()));
        }
        Ok(out)
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&[u8]>, new: &[u8]) -> KVResult<bool> {
        self.write(|table| {
            let matches = {
                let current = table.get(key).map_err(storage)?;
                current.as_ref().map(|v| v.value()) == expected
            };
            if matches {
                table.insert(key, new).map_err(storage)?;
            }
            Ok(matches)
        })
    }

    fn compare_and_delete(&self, key: &str, expected: &[u8]) -> KVResult<bool> {
        self.write(|table| {
            let matches = {
                let current = table.get(key).map_err(storage)?;
                current.as_ref().map(|v| v.value()) == Some(expected)
            };
            if matches {
                table.remove(key).map_err(storage)?;
            }
            Ok(matches)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_get_delete() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.set("span:p1", b"v").unwrap();
        assert_eq!(store.get("span:p1").unwrap(), Some(b"v".to_vec()));

        store.delete("span:p1").unwrap();
        assert_eq!(store.get("span:p1").unwrap(), None);
    }

    #[test]
    fn test_scan_stops_at_prefix_end() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.set("span:a", b"1").unwrap();
        store.set("span:b", b"2").unwrap();
        store.set("bw:c", b"3").unwrap();

        let results = store.scan("span:").unwrap();
        assert_eq!(
            results,
            vec![
                ("span:a".to_string(), b"1".to_vec()),
                ("span:b".to_string(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn test_compare_and_swap_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            assert!(store.compare_and_swap("span", None, b"v1").unwrap());
            assert!(!store.compare_and_swap("span", Some(b"v0"), b"v2").unwrap());
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("span").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_compare_and_delete_keeps_newer_value() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.set("bw", b"old").unwrap();
        store.set("bw", b"new").unwrap();
        assert!(!store.compare_and_delete("bw", b"old").unwrap());
        assert_eq!(store.get("bw").unwrap(), Some(b"new".to_vec()));

        assert!(store.compare_and_delete("bw", b"new").unwrap());
        assert_eq!(store.get("bw").unwrap(), None);
    }
}
