//! Per-project placeholder span persistence.
//!
//! One span per project, stored as JSON under `span:{project_id}` together
//! with a version counter. Writes go through the store's compare-and-swap, so
//! concurrent writers never interleave partial updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use namecast_kv::KVStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::types::PlaceholderSpan;

const KEY_PREFIX: &str = "span:";

/// Attempts for a last-write-wins put before giving up under contention.
const MAX_PUT_ATTEMPTS: usize = 16;

/// A persisted span with its version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSpan {
    pub span: PlaceholderSpan,
    /// Starts at 1, incremented by every write.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

/// Span store over any [`KVStore`].
#[derive(Clone)]
pub struct SpanStore {
    kv: Arc<dyn KVStore>,
}

impl SpanStore {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    fn key(project_id: &str) -> String {
        format!("{}{}", KEY_PREFIX, project_id)
    }

    fn decode(project_id: &str, raw: &[u8]) -> Result<StoredSpan, StoreError> {
        serde_json::from_slice(raw).map_err(|e| StoreError::Corrupt {
            project_id: project_id.to_string(),
            message: e.to_string(),
        })
    }

    fn encode(project_id: &str, stored: &StoredSpan) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(stored).map_err(|e| StoreError::Corrupt {
            project_id: project_id.to_string(),
            message: e.to_string(),
        })
    }

    pub fn get(&self, project_id: &str) -> Result<Option<StoredSpan>, StoreError> {
        match self.kv.get(&Self::key(project_id))? {
            Some(raw) => Ok(Some(Self::decode(project_id, &raw)?)),
            None => Ok(None),
        }
    }

    /// Stores `span`, replacing whatever is there.
    pub fn put(&self, project_id: &str, span: PlaceholderSpan) -> Result<StoredSpan, StoreError> {
        span.validate()?;
        let key = Self::key(project_id);
        let mut last_seen = None;
        for _ in 0..MAX_PUT_ATTEMPTS {
            let current = self.kv.get(&key)?;
            let version = match &current {
                Some(raw) => Self::decode(project_id, raw)?.version,
                None => 0,
            };
            last_seen = current.as_ref().map(|_| version);
            if let Some(stored) = self.try_write(project_id, &key, current.as_deref(), version, span)? {
                return Ok(stored);
            }
        }
        Err(StoreError::Conflict {
            project_id: project_id.to_string(),
            expected: last_seen,
            actual: self.get(project_id)?.map(|s| s.version),
        })
    }

    /// Stores `span` only if the current version is `expected` (`None` meaning
    /// no span is stored yet).
    pub fn put_if_version(
        &self,
        project_id: &str,
        expected: Option<u64>,
        span: PlaceholderSpan,
    ) -> Result<StoredSpan, StoreError> {
        span.validate()?;
        let key = Self::key(project_id);
        let current = self.kv.get(&key)?;
        let actual = match &current {
            Some(raw) => Some(Self::decode(project_id, raw)?.version),
            None => None,
        };
        let conflict = |actual| StoreError::Conflict {
            project_id: project_id.to_string(),
            expected,
            actual,
        };
        if actual != expected {
            return Err(conflict(actual));
        }
        match self.try_write(project_id, &key, current.as_deref(), actual.unwrap_or(0), span)? {
            Some(stored) => Ok(stored),
            None => Err(conflict(self.get(project_id)?.map(|s| s.version))),
        }
    }

    fn try_write(
        &self,
        project_id: &str,
        key: &str,
        current: Option<&[u8]>,
        version: u64,
        span: PlaceholderSpan,
    ) -> Result<Option<StoredSpan>, StoreError> {
        let stored = StoredSpan {
            span,
            version: version + 1,
            updated_at: Utc::now(),
        };
        let raw = Self::encode(project_id, &stored)?;
        if self.kv.compare_and_swap(key, current, &raw)? {
            debug!(project_id, version = stored.version, "stored placeholder span");
            Ok(Some(stored))
        } else {
            Ok(None)
        }
    }

    pub fn clear(&self, project_id: &str) -> Result<(), StoreError> {
        self.kv.delete(&Self::key(project_id))?;
        Ok(())
    }

    /// All stored spans keyed by project id, sorted by project id.
    pub fn list(&self) -> Result<Vec<(String, StoredSpan)>, StoreError> {
        self.kv
            .scan(KEY_PREFIX)?
            .into_iter()
            .map(|(key, raw)| {
                let project_id = key[KEY_PREFIX.len()..].to_string();
                let stored = Self::decode(&project_id, &raw)?;
                Ok((project_id, stored))
            })
            .collect()
    }
}
