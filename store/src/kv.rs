//! Ordered key-value store contract.

use crate::StoreError;

/// Scan order for [`KvStore::scan_prefix`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterDirection {
    Ascending,
    Descending,
}

/// A single write queued in a [`WriteBatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// A group of writes applied atomically by [`KvStore::commit`].
///
/// Operations are applied in insertion order, so a delete followed by a put
/// of the same key leaves the key present. A batch that is dropped without
/// being committed has no effect.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete { key: key.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Byte-ordered key-value storage.
///
/// Keys are compared lexicographically. Implementations must be safe to share
/// between readers; writers are serialized by the host (one state transition
/// at a time), and [`commit`](Self::commit) makes a batch visible all at once.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Deleting an absent key is not an error.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// All entries whose key starts with `prefix`, in key order.
    ///
    /// The result is a snapshot taken when the scan starts, so callers may
    /// write to the store while walking it.
    fn scan_prefix(
        &self,
        prefix: &[u8],
        direction: IterDirection,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// At most `limit` entries under `prefix` in `direction` order, starting
    /// strictly after `after` (a key under `prefix`) when given.
    ///
    /// Walking a prefix page by page keeps memory bounded and lets callers
    /// stop without reading the rest. Each page is read on its own, so
    /// writes between pages are visible to later pages.
    fn scan_prefix_page(
        &self,
        prefix: &[u8],
        direction: IterDirection,
        after: Option<&[u8]>,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// Apply every operation of `batch` atomically.
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        direction: IterDirection,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        (**self).scan_prefix(prefix, direction)
    }

    fn scan_prefix_page(
        &self,
        prefix: &[u8],
        direction: IterDirection,
        after: Option<&[u8]>,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        (**self).scan_prefix_page(prefix, direction, after, limit)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).commit(batch)
    }
}

/// The smallest key greater than every key starting with `prefix`, or
/// `None` when no such key exists (empty or all-`0xff` prefix).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_end_skips_saturated_bytes() {
        assert_eq!(prefix_end(&[0x21]), Some(vec![0x22]));
        assert_eq!(prefix_end(&[0x21, 0xff]), Some(vec![0x22]));
        assert_eq!(prefix_end(&[0xff, 0xff]), None);
        assert_eq!(prefix_end(&[]), None);
    }

    #[test]
    fn batch_keeps_insertion_order() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());
        batch.delete(b"a".to_vec());
        batch.put(b"a".to_vec(), b"1".to_vec());
        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.into_ops(),
            vec![
                BatchOp::Delete { key: b"a".to_vec() },
                BatchOp::Put {
                    key: b"a".to_vec(),
                    value: b"1".to_vec()
                },
            ]
        );
    }
}
