//! Per-proposal share deductions.
//!
//! When an account that has delegated its voting rights votes on a proposal
//! itself, its shares must not also be counted through its governor. The
//! deduction book keeps a marker per direct voter and proposal; the shares
//! to deduct are worked out from the voter's current governance delegation
//! and staking delegations whenever deductions are read, so a later
//! redelegation or stake change moves the deduction along with the shares.
//! Hosts that net deductions themselves can also record fixed amounts with
//! [`DeductionBook::add_deduction`]. The share ledger itself is never
//! touched.

use std::collections::BTreeMap;

use proxyvote_store::codec::{decode, encode};
use proxyvote_store::{keys, IterDirection, KvStore, StakingOracle, WriteBatch};
use proxyvote_types::{AccountAddress, Dec, GovernorAddress, ProposalId, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::delegation::GovernanceDelegations;
use crate::GovernanceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareDeduction {
    pub proposal_id: ProposalId,
    pub governor_address: GovernorAddress,
    pub validator_address: ValidatorAddress,
    pub shares: Dec,
}

/// Deductions of one proposal, by governor and validator.
pub type GovernorDeductions = BTreeMap<GovernorAddress, BTreeMap<ValidatorAddress, Dec>>;

pub struct DeductionBook<'a, S, O> {
    store: &'a S,
    oracle: &'a O,
}

impl<'a, S: KvStore, O: StakingOracle> DeductionBook<'a, S, O> {
    pub fn new(store: &'a S, oracle: &'a O) -> Self {
        Self { store, oracle }
    }

    /// Total deduction of (`proposal`, `governor`, `validator`).
    pub fn get(
        &self,
        proposal: ProposalId,
        governor: &GovernorAddress,
        validator: &ValidatorAddress,
    ) -> Result<Dec, GovernanceError> {
        Ok(self
            .deductions_for(proposal, governor)?
            .remove(validator)
            .unwrap_or_default())
    }

    /// Add a fixed `shares` amount to the deduction of (`proposal`,
    /// `governor`, `validator`).
    pub fn add_deduction(
        &self,
        proposal: ProposalId,
        governor: &GovernorAddress,
        validator: &ValidatorAddress,
        shares: &Dec,
    ) -> Result<(), GovernanceError> {
        if shares.is_zero() {
            return Ok(());
        }
        let key = keys::share_deduction_key(proposal, governor, validator);
        let current = match self.store.get(&key)? {
            Some(bytes) => decode::<ShareDeduction>(&key, &bytes)?.shares,
            None => Dec::zero(),
        };
        let deduction = ShareDeduction {
            proposal_id: proposal,
            governor_address: governor.clone(),
            validator_address: validator.clone(),
            shares: &current + shares,
        };
        self.store.put(&key, &encode(&deduction)?)?;
        Ok(())
    }

    /// Deductions against `governor` on `proposal`, by validator.
    pub fn deductions_for(
        &self,
        proposal: ProposalId,
        governor: &GovernorAddress,
    ) -> Result<BTreeMap<ValidatorAddress, Dec>, GovernanceError> {
        Ok(self.by_governor(proposal)?.remove(governor).unwrap_or_default())
    }

    /// Every deduction of `proposal`: the fixed amounts plus the current
    /// shares of each direct voter, charged to the governor it is delegated
    /// to now.
    pub fn by_governor(&self, proposal: ProposalId) -> Result<GovernorDeductions, GovernanceError> {
        let mut out = GovernorDeductions::new();
        for (key, value) in self
            .store
            .scan_prefix(&keys::share_deductions_prefix(proposal), IterDirection::Ascending)?
        {
            let deduction: ShareDeduction = decode(&key, &value)?;
            *out.entry(deduction.governor_address)
                .or_default()
                .entry(deduction.validator_address)
                .or_default() += &deduction.shares;
        }

        let delegations = GovernanceDelegations::new(self.store);
        for voter in self.independent_voters(proposal)? {
            let Some(delegation) = delegations.get(&voter)? else {
                continue;
            };
            if delegation.is_self_delegation() {
                continue;
            }
            let per_validator = out.entry(delegation.governor_address).or_default();
            for (validator, shares) in self.oracle.delegations(&voter)? {
                *per_validator.entry(validator).or_default() += &shares;
            }
        }
        out.retain(|_, per_validator| {
            per_validator.retain(|_, shares| !shares.is_zero());
            !per_validator.is_empty()
        });
        Ok(out)
    }

    /// Every deduction of `proposal`, flattened.
    pub fn all_for_proposal(&self, proposal: ProposalId) -> Result<Vec<ShareDeduction>, GovernanceError> {
        let mut out = Vec::new();
        for (governor, per_validator) in self.by_governor(proposal)? {
            for (validator, shares) in per_validator {
                out.push(ShareDeduction {
                    proposal_id: proposal,
                    governor_address: governor.clone(),
                    validator_address: validator,
                    shares,
                });
            }
        }
        Ok(out)
    }

    /// Accounts that voted on `proposal` directly, in address order.
    pub fn independent_voters(&self, proposal: ProposalId) -> Result<Vec<AccountAddress>, GovernanceError> {
        self.store
            .scan_prefix(&keys::independent_votes_prefix(proposal), IterDirection::Ascending)?
            .iter()
            .map(|(key, value)| decode(key, value).map_err(GovernanceError::from))
            .collect()
    }

    /// `delegator` voted on `proposal` directly. From now on its shares are
    /// deducted from its governor on that proposal, whichever governor that
    /// is when the tally runs. Governors' own accounts, and accounts with no
    /// governance delegation, are recorded but deduct nothing while they
    /// stay that way.
    ///
    /// Returns `false` when the vote was already recorded.
    pub fn record_independent_vote(
        &self,
        proposal: ProposalId,
        delegator: &AccountAddress,
    ) -> Result<bool, GovernanceError> {
        let marker = keys::independent_vote_key(proposal, delegator);
        if self.store.has(&marker)? {
            return Ok(false);
        }
        self.store.put(&marker, &encode(delegator)?)?;
        tracing::debug!(proposal = %proposal, delegator = %delegator, "independent vote recorded");
        Ok(true)
    }

    /// Forget every deduction and direct voter of `proposal`. Returns the
    /// number of records removed.
    pub fn clear_proposal(&self, proposal: ProposalId) -> Result<usize, GovernanceError> {
        let deductions = self
            .store
            .scan_prefix(&keys::share_deductions_prefix(proposal), IterDirection::Ascending)?;
        let markers = self
            .store
            .scan_prefix(&keys::independent_votes_prefix(proposal), IterDirection::Ascending)?;

        let mut batch = WriteBatch::new();
        for (key, _) in deductions.iter().chain(markers.iter()) {
            batch.delete(key.clone());
        }
        let removed = batch.len();
        self.store.commit(batch)?;

        tracing::debug!(proposal = %proposal, removed, "deductions cleared");
        Ok(removed)
    }
}
