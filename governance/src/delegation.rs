//! Governance delegation: an account entrusting its voting rights to a
//! governor.
//!
//! An account delegates to at most one governor. Delegating moves the
//! account's staking shares into the governor's share ledger; undelegating
//! takes them out again. An active governor's own account is always
//! delegated to itself.

use proxyvote_store::codec::{decode, encode};
use proxyvote_store::{keys, IterDirection, KvStore, StakingOracle, WriteBatch};
use proxyvote_types::{AccountAddress, Dec, GovernorAddress, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::governor::Governor;
use crate::keeper::GovernorKeeper;
use crate::registry::stage_power_index;
use crate::shares::ShareChange;
use crate::GovernanceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceDelegation {
    pub delegator_address: AccountAddress,
    pub governor_address: GovernorAddress,
}

impl GovernanceDelegation {
    pub fn new(delegator_address: AccountAddress, governor_address: GovernorAddress) -> Self {
        Self {
            delegator_address,
            governor_address,
        }
    }

    /// Whether this is a governor's own account delegating to that governor.
    pub fn is_self_delegation(&self) -> bool {
        GovernorAddress::from_account(&self.delegator_address) == self.governor_address
    }
}

/// Storage for delegations and their by-governor index.
pub struct GovernanceDelegations<'a, S> {
    store: &'a S,
}

impl<'a, S: KvStore> GovernanceDelegations<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn get(&self, delegator: &AccountAddress) -> Result<Option<GovernanceDelegation>, GovernanceError> {
        let key = keys::governance_delegation_key(delegator);
        match self.store.get(&key)? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Record `delegation`, replacing any previous one of the same delegator
    /// together with its index entry.
    pub fn set(&self, delegation: &GovernanceDelegation) -> Result<(), GovernanceError> {
        let previous = self.get(&delegation.delegator_address)?;
        let mut batch = WriteBatch::new();
        stage_set(&mut batch, previous.as_ref(), delegation)?;
        self.store.commit(batch)?;
        Ok(())
    }

    /// Remove the delegation of `delegator`, returning it.
    pub fn remove(&self, delegator: &AccountAddress) -> Result<Option<GovernanceDelegation>, GovernanceError> {
        let Some(previous) = self.get(delegator)? else {
            return Ok(None);
        };
        let mut batch = WriteBatch::new();
        stage_remove(&mut batch, &previous);
        self.store.commit(batch)?;
        Ok(Some(previous))
    }

    /// Delegations to `governor`, in delegator address order.
    pub fn of_governor(&self, governor: &GovernorAddress) -> Result<Vec<GovernanceDelegation>, GovernanceError> {
        self.store
            .scan_prefix(
                &keys::delegations_by_governor_prefix(governor),
                IterDirection::Ascending,
            )?
            .iter()
            .map(|(key, value)| decode(key, value).map_err(GovernanceError::from))
            .collect()
    }
}

impl<S: KvStore, O: StakingOracle> GovernorKeeper<S, O> {
    pub fn governance_delegation(
        &self,
        delegator: &AccountAddress,
    ) -> Result<Option<GovernanceDelegation>, GovernanceError> {
        self.delegations().get(delegator)
    }

    pub fn governance_delegations_of(
        &self,
        governor: &GovernorAddress,
    ) -> Result<Vec<GovernanceDelegation>, GovernanceError> {
        self.delegations().of_governor(governor)
    }

    /// Delegate the voting rights of `delegator` to `governor`.
    ///
    /// Re-delegating to the current governor is a no-op. Any other existing
    /// delegation is undone first. Everything is read before anything is
    /// written, and the writes land in one batch.
    pub fn delegate_governance(
        &self,
        delegator: &AccountAddress,
        governor: &GovernorAddress,
    ) -> Result<(), GovernanceError> {
        let target = self
            .registry()
            .get(governor)?
            .ok_or_else(|| GovernanceError::GovernorNotFound(governor.to_string()))?;
        if !target.is_active() {
            return Err(GovernanceError::GovernorInactive(governor.to_string()));
        }

        let own = GovernorAddress::from_account(delegator);
        if own != *governor {
            if let Some(own_governor) = self.registry().get(&own)? {
                if own_governor.is_active() {
                    return Err(GovernanceError::GovernorCannotDelegate(delegator.to_string()));
                }
            }
        }

        let mut batch = WriteBatch::new();
        if self
            .stage_delegation(&mut batch, delegator, target.clone(), Some(&target))?
            .is_none()
        {
            return Ok(());
        }
        self.store().commit(batch)?;

        tracing::debug!(delegator = %delegator, governor = %governor, "governance delegated");
        Ok(())
    }

    /// Remove the governance delegation of `delegator`.
    pub fn undelegate_governance(&self, delegator: &AccountAddress) -> Result<(), GovernanceError> {
        let existing = self
            .delegations()
            .get(delegator)?
            .ok_or_else(|| GovernanceError::DelegationNotFound(delegator.to_string()))?;
        if existing.is_self_delegation() {
            let governor = self.registry().get(&existing.governor_address)?;
            if governor.is_some_and(|g| g.is_active()) {
                return Err(GovernanceError::SelfDelegationRequired(
                    existing.governor_address.to_string(),
                ));
            }
        }

        let staking = self.oracle().delegations(delegator)?;
        let mut batch = WriteBatch::new();
        self.stage_share_change(
            &mut batch,
            &existing.governor_address,
            &staking,
            ShareChange::Decrease,
        )?;
        stage_remove(&mut batch, &existing);
        self.store().commit(batch)?;

        tracing::debug!(
            delegator = %delegator,
            governor = %existing.governor_address,
            "governance undelegated"
        );
        Ok(())
    }

    /// Staking hook: the shares `delegator` holds in `validator` changed from
    /// `old_shares` to `new_shares`. Moves the difference through to the
    /// delegator's governor, if any.
    pub fn on_staking_shares_changed(
        &self,
        delegator: &AccountAddress,
        validator: &ValidatorAddress,
        old_shares: &Dec,
        new_shares: &Dec,
    ) -> Result<(), GovernanceError> {
        let Some(delegation) = self.delegations().get(delegator)? else {
            return Ok(());
        };
        let (change, amount) = if new_shares > old_shares {
            (ShareChange::Increase, new_shares.saturating_sub(old_shares))
        } else if new_shares < old_shares {
            (ShareChange::Decrease, old_shares.saturating_sub(new_shares))
        } else {
            return Ok(());
        };

        let mut batch = WriteBatch::new();
        self.stage_share_change(
            &mut batch,
            &delegation.governor_address,
            &[(validator.clone(), amount)],
            change,
        )?;
        self.store().commit(batch)?;
        Ok(())
    }

    /// Stage `delegator` moving to `target`: withdrawing its previous
    /// delegation, the relation, the share entries and the power of both
    /// governors. `indexed` is the stored record of `target`, if any; the
    /// staged record is `target` with its power recomputed.
    ///
    /// Returns `None`, staging nothing, when `delegator` is already
    /// delegated to `target`.
    pub(crate) fn stage_delegation(
        &self,
        batch: &mut WriteBatch,
        delegator: &AccountAddress,
        mut target: Governor,
        indexed: Option<&Governor>,
    ) -> Result<Option<Governor>, GovernanceError> {
        let existing = self.delegations().get(delegator)?;
        if existing
            .as_ref()
            .is_some_and(|d| d.governor_address == target.address)
        {
            return Ok(None);
        }
        let staking = self.oracle().delegations(delegator)?;

        if let Some(previous) = &existing {
            self.stage_share_change(batch, &previous.governor_address, &staking, ShareChange::Decrease)?;
        }
        stage_set(
            batch,
            existing.as_ref(),
            &GovernanceDelegation::new(delegator.clone(), target.address.clone()),
        )?;

        let ledger = self.ledger();
        let current = ledger.validator_shares(&target.address)?;
        let shares = ledger.stage_changes(batch, &target.address, current, &staking, ShareChange::Increase)?;
        target.voting_power = Dec::from_int(&ledger.tokens_for_shares(&shares)?);
        stage_power_index(batch, indexed, &target)?;
        Ok(Some(target))
    }

    /// Stage a change of `governor`'s share entries and, if the governor
    /// exists, its re-indexed power.
    fn stage_share_change(
        &self,
        batch: &mut WriteBatch,
        governor: &GovernorAddress,
        changes: &[(ValidatorAddress, Dec)],
        change: ShareChange,
    ) -> Result<(), GovernanceError> {
        let ledger = self.ledger();
        let current = ledger.validator_shares(governor)?;
        let shares = ledger.stage_changes(batch, governor, current, changes, change)?;
        if let Some(stored) = self.registry().get(governor)? {
            let mut updated = stored.clone();
            updated.voting_power = Dec::from_int(&ledger.tokens_for_shares(&shares)?);
            stage_power_index(batch, Some(&stored), &updated)?;
        }
        Ok(())
    }
}

fn stage_set(
    batch: &mut WriteBatch,
    previous: Option<&GovernanceDelegation>,
    delegation: &GovernanceDelegation,
) -> Result<(), GovernanceError> {
    if let Some(previous) = previous {
        stage_remove(batch, previous);
    }
    let value = encode(delegation)?;
    batch.put(
        keys::governance_delegation_key(&delegation.delegator_address),
        value.clone(),
    );
    batch.put(
        keys::delegation_by_governor_key(&delegation.governor_address, &delegation.delegator_address),
        value,
    );
    Ok(())
}

fn stage_remove(batch: &mut WriteBatch, delegation: &GovernanceDelegation) {
    batch.delete(keys::governance_delegation_key(&delegation.delegator_address));
    batch.delete(keys::delegation_by_governor_key(
        &delegation.governor_address,
        &delegation.delegator_address,
    ));
}
