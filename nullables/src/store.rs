//! Nullable store: thread-safe in-memory key-value storage for testing.

use proxyvote_store::{prefix_end, BatchOp, IterDirection, KvStore, StoreError, WriteBatch};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

/// An ordered in-memory [`KvStore`].
///
/// A single mutex guards the map, so a committed batch is observed either
/// entirely or not at all.
pub struct NullKvStore {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl NullKvStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored keys starting with `prefix`.
    pub fn count_prefix(&self, prefix: &[u8]) -> usize {
        self.entries
            .lock()
            .unwrap()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .count()
    }
}

impl Default for NullKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for NullKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        direction: IterDirection,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let entries = self.entries.lock().unwrap();
        let mut results: Vec<(Vec<u8>, Vec<u8>)> = entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if direction == IterDirection::Descending {
            results.reverse();
        }
        Ok(results)
    }

    fn scan_prefix_page(
        &self,
        prefix: &[u8],
        direction: IterDirection,
        after: Option<&[u8]>,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        if after.is_some_and(|key| !key.starts_with(prefix)) {
            return Ok(Vec::new());
        }
        let end = match prefix_end(prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let entries = self.entries.lock().unwrap();
        let page = match direction {
            IterDirection::Ascending => {
                let start = match after {
                    Some(key) => Bound::Excluded(key.to_vec()),
                    None => Bound::Included(prefix.to_vec()),
                };
                entries
                    .range::<Vec<u8>, _>((start, end))
                    .take(limit)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }
            IterDirection::Descending => {
                let end = match after {
                    Some(key) => Bound::Excluded(key.to_vec()),
                    None => end,
                };
                entries
                    .range::<Vec<u8>, _>((Bound::Included(prefix.to_vec()), end))
                    .rev()
                    .take(limit)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }
        };
        Ok(page)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    entries.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}
