//! Per-governor validator shares.
//!
//! A governor's share entry for a validator is the sum of the staking shares
//! that its governance delegators hold in that validator. Voting power is the
//! token value of those shares.

use std::collections::BTreeMap;

use proxyvote_store::codec::{decode, encode};
use proxyvote_store::{keys, IterDirection, KvStore, StakingOracle, WriteBatch};
use proxyvote_types::{Dec, GovernorAddress, Int, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::GovernanceError;

/// Stored form of one share entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorValShares {
    pub governor_address: GovernorAddress,
    pub validator_address: ValidatorAddress,
    pub shares: Dec,
}

pub struct ShareLedger<'a, S, O> {
    store: &'a S,
    oracle: &'a O,
}

impl<'a, S: KvStore, O: StakingOracle> ShareLedger<'a, S, O> {
    pub fn new(store: &'a S, oracle: &'a O) -> Self {
        Self { store, oracle }
    }

    /// Shares held for `governor` in `validator`; zero when there is no entry.
    pub fn get_shares(
        &self,
        governor: &GovernorAddress,
        validator: &ValidatorAddress,
    ) -> Result<Dec, GovernanceError> {
        let key = keys::validator_shares_key(governor, validator);
        match self.store.get(&key)? {
            Some(bytes) => {
                let entry: GovernorValShares = decode(&key, &bytes)?;
                Ok(entry.shares)
            }
            None => Ok(Dec::zero()),
        }
    }

    /// Overwrite one entry. Zero removes it.
    pub fn set_shares(
        &self,
        governor: &GovernorAddress,
        validator: &ValidatorAddress,
        shares: &Dec,
    ) -> Result<(), GovernanceError> {
        let mut batch = WriteBatch::new();
        stage_shares(&mut batch, governor, validator, shares)?;
        self.store.commit(batch)?;
        Ok(())
    }

    pub fn increase_shares(
        &self,
        governor: &GovernorAddress,
        validator: &ValidatorAddress,
        amount: &Dec,
    ) -> Result<(), GovernanceError> {
        let current = self.get_shares(governor, validator)?;
        self.set_shares(
            governor,
            validator,
            &apply_change(governor, validator, &current, amount, ShareChange::Increase),
        )
    }

    /// Subtract `amount`, stopping at zero.
    pub fn decrease_shares(
        &self,
        governor: &GovernorAddress,
        validator: &ValidatorAddress,
        amount: &Dec,
    ) -> Result<(), GovernanceError> {
        let current = self.get_shares(governor, validator)?;
        self.set_shares(
            governor,
            validator,
            &apply_change(governor, validator, &current, amount, ShareChange::Decrease),
        )
    }

    /// Apply `changes` to `shares`, the current entries of `governor`, and
    /// stage the touched entries into `batch`. Returns the updated entries.
    /// Nothing is written until the batch is committed.
    pub fn stage_changes(
        &self,
        batch: &mut WriteBatch,
        governor: &GovernorAddress,
        mut shares: BTreeMap<ValidatorAddress, Dec>,
        changes: &[(ValidatorAddress, Dec)],
        change: ShareChange,
    ) -> Result<BTreeMap<ValidatorAddress, Dec>, GovernanceError> {
        for (validator, amount) in changes {
            let current = shares.remove(validator).unwrap_or_default();
            let updated = apply_change(governor, validator, &current, amount, change);
            stage_shares(batch, governor, validator, &updated)?;
            if !updated.is_zero() {
                shares.insert(validator.clone(), updated);
            }
        }
        Ok(shares)
    }

    /// All entries of `governor`, in validator address order.
    pub fn entries(&self, governor: &GovernorAddress) -> Result<Vec<GovernorValShares>, GovernanceError> {
        self.store
            .scan_prefix(&keys::validator_shares_prefix(governor), IterDirection::Ascending)?
            .iter()
            .map(|(key, value)| decode(key, value).map_err(GovernanceError::from))
            .collect()
    }

    pub fn validator_shares(
        &self,
        governor: &GovernorAddress,
    ) -> Result<BTreeMap<ValidatorAddress, Dec>, GovernanceError> {
        Ok(self
            .entries(governor)?
            .into_iter()
            .map(|e| (e.validator_address, e.shares))
            .collect())
    }

    /// Token value of everything delegated to `governor`.
    pub fn compute_bonded_tokens(&self, governor: &GovernorAddress) -> Result<Int, GovernanceError> {
        self.tokens_for_shares(&self.validator_shares(governor)?)
    }

    /// Sum of `floor(shares * bonded / total_shares)` over `shares`, one
    /// truncation per validator. Validators the oracle does not know, or with
    /// no delegator shares, contribute nothing.
    pub fn tokens_for_shares(
        &self,
        shares: &BTreeMap<ValidatorAddress, Dec>,
    ) -> Result<Int, GovernanceError> {
        let mut total = Int::zero();
        for (validator, amount) in shares {
            match self.oracle.validator(validator)? {
                Some(info) => total += &info.tokens_from_shares(amount),
                None => {
                    tracing::debug!(validator = %validator, "unknown validator, no tokens attributed");
                }
            }
        }
        Ok(total)
    }
}

/// Direction of a share adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareChange {
    Increase,
    /// Saturates at zero.
    Decrease,
}

fn apply_change(
    governor: &GovernorAddress,
    validator: &ValidatorAddress,
    current: &Dec,
    amount: &Dec,
    change: ShareChange,
) -> Dec {
    match change {
        ShareChange::Increase => current + amount,
        ShareChange::Decrease => {
            if current < amount {
                tracing::warn!(
                    governor = %governor,
                    validator = %validator,
                    current = %current,
                    amount = %amount,
                    "share decrease exceeds entry, clamping to zero"
                );
            }
            current.saturating_sub(amount)
        }
    }
}

fn stage_shares(
    batch: &mut WriteBatch,
    governor: &GovernorAddress,
    validator: &ValidatorAddress,
    shares: &Dec,
) -> Result<(), GovernanceError> {
    let key = keys::validator_shares_key(governor, validator);
    if shares.is_zero() {
        batch.delete(key);
        return Ok(());
    }
    let entry = GovernorValShares {
        governor_address: governor.clone(),
        validator_address: validator.clone(),
        shares: shares.clone(),
    };
    batch.put(key, encode(&entry)?);
    Ok(())
}
