//! Governor records and the power-ranked index over them.
//!
//! The index holds exactly one `power ‖ address` key per governor. A power
//! change never edits a key in place: the old key is deleted and the new one
//! inserted, in the same [`WriteBatch`] that persists the updated record.

use proxyvote_store::codec::{decode, encode};
use proxyvote_store::{keys, IterDirection, KvStore, StoreError, WriteBatch};
use proxyvote_types::GovernorAddress;

use crate::governor::Governor;
use crate::GovernanceError;

/// Index entries fetched per read while walking the power index.
const POWER_SCAN_PAGE: usize = 64;

pub struct GovernorRegistry<'a, S> {
    store: &'a S,
}

impl<'a, S: KvStore> GovernorRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn get(&self, address: &GovernorAddress) -> Result<Option<Governor>, GovernanceError> {
        let key = keys::governor_key(address);
        match self.store.get(&key)? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Upsert the record. Does not touch the power index.
    pub fn set(&self, governor: &Governor) -> Result<(), GovernanceError> {
        self.store
            .put(&keys::governor_key(&governor.address), &encode(governor)?)?;
        Ok(())
    }

    /// All governors in address order.
    pub fn list_all(&self) -> Result<Vec<Governor>, GovernanceError> {
        let mut out = Vec::new();
        self.iterate(|_, g| {
            out.push(g.clone());
            false
        })?;
        Ok(out)
    }

    /// Active governors in address order.
    pub fn list_active(&self) -> Result<Vec<Governor>, GovernanceError> {
        let mut out = Vec::new();
        self.iterate(|_, g| {
            if g.is_active() {
                out.push(g.clone());
            }
            false
        })?;
        Ok(out)
    }

    /// Visit every governor in address order. The callback receives the
    /// running index and returns `true` to stop.
    pub fn iterate<F>(&self, mut cb: F) -> Result<(), GovernanceError>
    where
        F: FnMut(usize, &Governor) -> bool,
    {
        let entries = self
            .store
            .scan_prefix(&keys::governors_prefix(), IterDirection::Ascending)?;
        for (i, (key, value)) in entries.iter().enumerate() {
            let governor: Governor = decode(key, value)?;
            if cb(i, &governor) {
                break;
            }
        }
        Ok(())
    }

    pub fn set_power_index_entry(&self, governor: &Governor) -> Result<(), GovernanceError> {
        self.store.put(
            &keys::governor_by_power_key(&governor.address, &governor.power_key_value()),
            governor.address.as_bytes(),
        )?;
        Ok(())
    }

    pub fn delete_power_index_entry(&self, governor: &Governor) -> Result<(), GovernanceError> {
        self.store.delete(&keys::governor_by_power_key(
            &governor.address,
            &governor.power_key_value(),
        ))?;
        Ok(())
    }

    /// Persist `governor` and move its index entry from the stored power to
    /// the new one, atomically.
    pub fn update_power_index(&self, governor: &Governor) -> Result<(), GovernanceError> {
        let mut batch = WriteBatch::new();
        let previous = self.get(&governor.address)?;
        stage_power_index(&mut batch, previous.as_ref(), governor)?;
        self.store.commit(batch)?;

        tracing::debug!(
            governor = %governor.address,
            power = %governor.voting_power,
            status = %governor.status,
            "power index updated"
        );
        Ok(())
    }

    /// Governor addresses in descending power order, ties broken by
    /// descending address bytes.
    pub fn power_ranking(&self) -> Result<Vec<GovernorAddress>, GovernanceError> {
        self.store
            .scan_prefix(&keys::governors_by_power_prefix(), IterDirection::Descending)?
            .iter()
            .map(|(key, value)| index_address(key, value))
            .collect()
    }

    /// Walk the power index from the top and yield active governors for
    /// which `is_eligible` holds, at most `max_count` of them.
    ///
    /// The index is read in pages, so the walk stops reading once the cap is
    /// reached. Governors that are inactive or fail the predicate are skipped
    /// without consuming a slot. The callback receives the number of governors
    /// yielded before this one and returns `true` to stop early. Errors from
    /// either closure abort the walk.
    pub fn iterate_top_by_power<P, F>(
        &self,
        max_count: u64,
        mut is_eligible: P,
        mut cb: F,
    ) -> Result<(), GovernanceError>
    where
        P: FnMut(&Governor) -> Result<bool, GovernanceError>,
        F: FnMut(u64, &Governor) -> Result<bool, GovernanceError>,
    {
        if max_count == 0 {
            return Ok(());
        }
        let prefix = keys::governors_by_power_prefix();
        let mut after: Option<Vec<u8>> = None;
        let mut yielded = 0u64;
        loop {
            let page = self.store.scan_prefix_page(
                &prefix,
                IterDirection::Descending,
                after.as_deref(),
                POWER_SCAN_PAGE,
            )?;
            for (key, value) in &page {
                let address = index_address(key, value)?;
                let governor = self.get(&address)?.ok_or_else(|| {
                    StoreError::Corruption(format!("power index points at missing governor {address}"))
                })?;
                if !governor.is_active() || !is_eligible(&governor)? {
                    continue;
                }
                let stop = cb(yielded, &governor)?;
                yielded += 1;
                if stop || yielded >= max_count {
                    return Ok(());
                }
            }
            if page.len() < POWER_SCAN_PAGE {
                break;
            }
            after = page.last().map(|(key, _)| key.clone());
        }
        Ok(())
    }
}

/// Stage the record of `governor` and its index entry into `batch`,
/// removing the entry of `indexed`, the record currently stored, if any.
pub fn stage_power_index(
    batch: &mut WriteBatch,
    indexed: Option<&Governor>,
    governor: &Governor,
) -> Result<(), GovernanceError> {
    if let Some(previous) = indexed {
        batch.delete(keys::governor_by_power_key(
            &previous.address,
            &previous.power_key_value(),
        ));
    }
    batch.put(
        keys::governor_by_power_key(&governor.address, &governor.power_key_value()),
        governor.address.as_bytes().to_vec(),
    );
    batch.put(keys::governor_key(&governor.address), encode(governor)?);
    Ok(())
}

fn index_address(key: &[u8], value: &[u8]) -> Result<GovernorAddress, GovernanceError> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|raw| GovernorAddress::parse(raw).ok())
        .ok_or_else(|| {
            StoreError::Corruption(format!(
                "power index entry {} does not hold a governor address",
                hex::encode(key)
            ))
            .into()
        })
}
