//! JSON snapshot of the staking ledger and the governance state to load.
//!
//! ```json
//! {
//!   "validators": [{ "address": "val1a", "bonded_tokens": "2000", "delegator_shares": "1000" }],
//!   "delegations": [{ "delegator": "acc1alice", "validator": "val1a", "shares": "1000" }],
//!   "governors": [{ "address": "gov1alice", "description": { "moniker": "alice" } }],
//!   "governance_delegations": [{ "delegator": "acc1dave", "governor": "gov1alice" }],
//!   "votes": [{ "proposal": 1, "governor": "gov1alice", "options": [{ "option": "yes", "weight": "1" }] }],
//!   "independent_votes": [{ "proposal": 1, "delegator": "acc1dave" }]
//! }
//! ```
//!
//! The staking half backs a [`SnapshotStakingOracle`]. The governance half is
//! replayed through the keeper once per data directory.

use std::collections::BTreeMap;
use std::path::Path;

use proxyvote_governance::{
    GovernorDescription, GovernorKeeper, GovernorStatus, WeightedVoteOptions,
};
use proxyvote_store::keys::meta_key;
use proxyvote_store::{KvStore, StakingOracle, StoreError, ValidatorInfo};
use proxyvote_types::{AccountAddress, Dec, GovernorAddress, Int, ProposalId, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

const IMPORTED_MARKER: &str = "snapshot_imported";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub validators: Vec<ValidatorEntry>,
    #[serde(default)]
    pub delegations: Vec<DelegationEntry>,
    #[serde(default)]
    pub governors: Vec<GovernorEntry>,
    #[serde(default)]
    pub governance_delegations: Vec<GovernanceDelegationEntry>,
    #[serde(default)]
    pub votes: Vec<VoteEntry>,
    #[serde(default)]
    pub independent_votes: Vec<IndependentVoteEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidatorEntry {
    pub address: ValidatorAddress,
    pub bonded_tokens: Int,
    pub delegator_shares: Dec,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DelegationEntry {
    pub delegator: AccountAddress,
    pub validator: ValidatorAddress,
    pub shares: Dec,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernorEntry {
    pub address: GovernorAddress,
    pub description: GovernorDescription,
    #[serde(default = "default_status")]
    pub status: GovernorStatus,
}

fn default_status() -> GovernorStatus {
    GovernorStatus::Active
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceDelegationEntry {
    pub delegator: AccountAddress,
    pub governor: GovernorAddress,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteEntry {
    pub proposal: ProposalId,
    pub governor: GovernorAddress,
    pub options: WeightedVoteOptions,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndependentVoteEntry {
    pub proposal: ProposalId,
    pub delegator: AccountAddress,
}

impl Snapshot {
    pub fn from_json_file(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Snapshot(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, CliError> {
        serde_json::from_str(s).map_err(|e| CliError::Snapshot(e.to_string()))
    }

    /// Governor votes cast on `proposal`. A later entry for the same governor
    /// replaces an earlier one.
    pub fn votes_for(&self, proposal: ProposalId) -> BTreeMap<GovernorAddress, WeightedVoteOptions> {
        self.votes
            .iter()
            .filter(|v| v.proposal == proposal)
            .map(|v| (v.governor.clone(), v.options.clone()))
            .collect()
    }

    /// Build the staking oracle from the staking half.
    pub fn staking_oracle(&self) -> SnapshotStakingOracle {
        let validators = self
            .validators
            .iter()
            .map(|v| {
                (
                    v.address.clone(),
                    ValidatorInfo {
                        bonded_tokens: v.bonded_tokens.clone(),
                        delegator_shares: v.delegator_shares.clone(),
                    },
                )
            })
            .collect();
        let mut delegations: BTreeMap<AccountAddress, BTreeMap<ValidatorAddress, Dec>> = BTreeMap::new();
        for d in &self.delegations {
            *delegations
                .entry(d.delegator.clone())
                .or_default()
                .entry(d.validator.clone())
                .or_default() += &d.shares;
        }
        SnapshotStakingOracle {
            validators,
            delegations,
        }
    }

    /// Replay the governance half into `keeper`, unless this store already
    /// holds an import. Returns whether anything was imported.
    pub fn import_into<S, O>(&self, keeper: &GovernorKeeper<S, O>) -> Result<bool, CliError>
    where
        S: KvStore,
        O: StakingOracle,
    {
        let marker = meta_key(IMPORTED_MARKER);
        if keeper.store().has(&marker)? {
            tracing::debug!("snapshot already imported");
            return Ok(false);
        }

        for g in &self.governors {
            keeper.create_governor(&g.address, g.description.clone())?;
        }
        for d in &self.governance_delegations {
            keeper.delegate_governance(&d.delegator, &d.governor)?;
        }
        for g in &self.governors {
            if g.status == GovernorStatus::Inactive {
                keeper.update_governor_status(&g.address, GovernorStatus::Inactive)?;
            }
        }
        let deductions = keeper.deductions();
        for v in &self.independent_votes {
            deductions.record_independent_vote(v.proposal, &v.delegator)?;
        }

        keeper.store().put(&marker, b"1")?;
        tracing::info!(
            governors = self.governors.len(),
            delegations = self.governance_delegations.len(),
            independent_votes = self.independent_votes.len(),
            "snapshot imported"
        );
        Ok(true)
    }
}

/// A [`StakingOracle`] over the staking half of a snapshot.
pub struct SnapshotStakingOracle {
    validators: BTreeMap<ValidatorAddress, ValidatorInfo>,
    delegations: BTreeMap<AccountAddress, BTreeMap<ValidatorAddress, Dec>>,
}

impl StakingOracle for SnapshotStakingOracle {
    fn validator(&self, address: &ValidatorAddress) -> Result<Option<ValidatorInfo>, StoreError> {
        Ok(self.validators.get(address).cloned())
    }

    fn iterate_delegations(
        &self,
        delegator: &AccountAddress,
        cb: &mut dyn FnMut(&ValidatorAddress, &Dec) -> bool,
    ) -> Result<(), StoreError> {
        if let Some(per_validator) = self.delegations.get(delegator) {
            for (validator, shares) in per_validator {
                if cb(validator, shares) {
                    break;
                }
            }
        }
        Ok(())
    }
}
