//! LMDB implementation of KvStore.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, Env};

use proxyvote_store::{prefix_end, BatchOp, IterDirection, KvStore, StoreError, WriteBatch};

use crate::LmdbError;

pub struct LmdbKvStore {
    pub(crate) env: Env,
    pub(crate) db: Database<Bytes, Bytes>,
}

impl KvStore for LmdbKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let value = self.db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.db
            .put(&mut wtxn, key, value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.db.delete(&mut wtxn, key).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        direction: IterDirection,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut results = Vec::new();
        match direction {
            IterDirection::Ascending => {
                let iter = self.db.prefix_iter(&rtxn, prefix).map_err(LmdbError::from)?;
                for entry in iter {
                    let (key, val) = entry.map_err(LmdbError::from)?;
                    results.push((key.to_vec(), val.to_vec()));
                }
            }
            IterDirection::Descending => {
                let iter = self
                    .db
                    .rev_prefix_iter(&rtxn, prefix)
                    .map_err(LmdbError::from)?;
                for entry in iter {
                    let (key, val) = entry.map_err(LmdbError::from)?;
                    results.push((key.to_vec(), val.to_vec()));
                }
            }
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
        let prefix_end = prefix_end(prefix);
        let end = match &prefix_end {
            Some(end) => Bound::Excluded(end.as_slice()),
            None => Bound::Unbounded,
        };
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut results = Vec::new();
        match direction {
            IterDirection::Ascending => {
                let start = match after {
                    Some(key) => Bound::Excluded(key),
                    None => Bound::Included(prefix),
                };
                let range: (Bound<&[u8]>, Bound<&[u8]>) = (start, end);
                let iter = self.db.range(&rtxn, &range).map_err(LmdbError::from)?;
                for entry in iter.take(limit) {
                    let (key, val) = entry.map_err(LmdbError::from)?;
                    results.push((key.to_vec(), val.to_vec()));
                }
            }
            IterDirection::Descending => {
                let end = match after {
                    Some(key) => Bound::Excluded(key),
                    None => end,
                };
                let range: (Bound<&[u8]>, Bound<&[u8]>) = (Bound::Included(prefix), end);
                let iter = self.db.rev_range(&rtxn, &range).map_err(LmdbError::from)?;
                for entry in iter.take(limit) {
                    let (key, val) = entry.map_err(LmdbError::from)?;
                    results.push((key.to_vec(), val.to_vec()));
                }
            }
        }
        Ok(results)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        // Dropping the transaction on an early return aborts it, so a failed
        // batch leaves nothing behind.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    self.db
                        .put(&mut wtxn, &key, &value)
                        .map_err(LmdbError::from)?;
                }
                BatchOp::Delete { key } => {
                    self.db.delete(&mut wtxn, &key).map_err(LmdbError::from)?;
                }
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    fn open_test_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        (dir, env)
    }

    #[test]
    fn put_get_delete() {
        let (_dir, env) = open_test_env();
        let store = env.kv_store();

        assert_eq!(store.get(b"\x20gov1alice").unwrap(), None);
        store.put(b"\x20gov1alice", b"record").unwrap();
        assert_eq!(store.get(b"\x20gov1alice").unwrap(), Some(b"record".to_vec()));
        assert!(store.has(b"\x20gov1alice").unwrap());

        store.delete(b"\x20gov1alice").unwrap();
        assert_eq!(store.get(b"\x20gov1alice").unwrap(), None);
        // Deleting again is fine.
        store.delete(b"\x20gov1alice").unwrap();
    }

    #[test]
    fn prefix_scan_both_directions() {
        let (_dir, env) = open_test_env();
        let store = env.kv_store();
        store.put(b"\x21\x01\x03gov1c", b"c").unwrap();
        store.put(b"\x21\x01\x01gov1a", b"a").unwrap();
        store.put(b"\x21\x01\x02gov1b", b"b").unwrap();
        store.put(b"\x22other", b"x").unwrap();

        let asc: Vec<Vec<u8>> = store
            .scan_prefix(b"\x21", IterDirection::Ascending)
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(asc, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        let desc: Vec<Vec<u8>> = store
            .scan_prefix(b"\x21", IterDirection::Descending)
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(desc, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn paged_scan_resumes_after_a_key() {
        let (_dir, env) = open_test_env();
        let store = env.kv_store();
        let entries: [(&[u8], &[u8]); 4] = [
            (b"\x21\x01\x01gov1a", b"a"),
            (b"\x21\x01\x02gov1b", b"b"),
            (b"\x21\x01\x03gov1c", b"c"),
            (b"\x22other", b"x"),
        ];
        for (key, value) in entries {
            store.put(key, value).unwrap();
        }
        let values = |page: Vec<(Vec<u8>, Vec<u8>)>| page.into_iter().map(|(_, v)| v).collect::<Vec<_>>();

        let first = store
            .scan_prefix_page(b"\x21", IterDirection::Descending, None, 2)
            .unwrap();
        assert_eq!(first.last().unwrap().0, b"\x21\x01\x02gov1b".to_vec());
        assert_eq!(values(first), vec![b"c".to_vec(), b"b".to_vec()]);

        let rest = store
            .scan_prefix_page(
                b"\x21",
                IterDirection::Descending,
                Some(&b"\x21\x01\x02gov1b"[..]),
                2,
            )
            .unwrap();
        assert_eq!(values(rest), vec![b"a".to_vec()]);

        let asc = store
            .scan_prefix_page(b"\x21", IterDirection::Ascending, Some(&b"\x21\x01\x01gov1a"[..]), 10)
            .unwrap();
        assert_eq!(values(asc), vec![b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn batch_applies_in_order() {
        let (_dir, env) = open_test_env();
        let store = env.kv_store();
        store.put(b"old", b"1").unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(b"old".to_vec());
        batch.put(b"new".to_vec(), b"2".to_vec());
        store.commit(batch).unwrap();

        assert_eq!(store.get(b"old").unwrap(), None);
        assert_eq!(store.get(b"new").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
            env.kv_store().put(b"k", b"v").unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        assert_eq!(env.kv_store().get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
