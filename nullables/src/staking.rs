//! Nullable staking ledger with programmable validators and delegations.

use proxyvote_store::{StakingOracle, StoreError, ValidatorInfo};
use proxyvote_types::{AccountAddress, Dec, Int, ValidatorAddress};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// An in-memory [`StakingOracle`] whose contents tests set directly.
///
/// Delegations are iterated in validator-address order.
pub struct NullStakingOracle {
    validators: Mutex<BTreeMap<ValidatorAddress, ValidatorInfo>>,
    delegations: Mutex<BTreeMap<AccountAddress, BTreeMap<ValidatorAddress, Dec>>>,
    failing_delegation_reads: Mutex<usize>,
}

impl NullStakingOracle {
    pub fn new() -> Self {
        Self {
            validators: Mutex::new(BTreeMap::new()),
            delegations: Mutex::new(BTreeMap::new()),
            failing_delegation_reads: Mutex::new(0),
        }
    }

    /// Make the next `count` delegation reads fail with a backend error.
    pub fn fail_delegation_reads(&self, count: usize) {
        *self.failing_delegation_reads.lock().unwrap() = count;
    }

    pub fn set_validator(&self, address: &ValidatorAddress, bonded_tokens: Int, delegator_shares: Dec) {
        self.validators.lock().unwrap().insert(
            address.clone(),
            ValidatorInfo {
                bonded_tokens,
                delegator_shares,
            },
        );
    }

    /// Set the shares `delegator` holds in `validator`; zero removes the
    /// delegation.
    pub fn set_delegation(&self, delegator: &AccountAddress, validator: &ValidatorAddress, shares: Dec) {
        let mut delegations = self.delegations.lock().unwrap();
        if shares.is_zero() {
            if let Some(per_validator) = delegations.get_mut(delegator) {
                per_validator.remove(validator);
                if per_validator.is_empty() {
                    delegations.remove(delegator);
                }
            }
            return;
        }
        delegations
            .entry(delegator.clone())
            .or_default()
            .insert(validator.clone(), shares);
    }

    pub fn delegation(&self, delegator: &AccountAddress, validator: &ValidatorAddress) -> Dec {
        self.delegations
            .lock()
            .unwrap()
            .get(delegator)
            .and_then(|m| m.get(validator))
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for NullStakingOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl StakingOracle for NullStakingOracle {
    fn validator(&self, address: &ValidatorAddress) -> Result<Option<ValidatorInfo>, StoreError> {
        Ok(self.validators.lock().unwrap().get(address).cloned())
    }

    fn iterate_delegations(
        &self,
        delegator: &AccountAddress,
        cb: &mut dyn FnMut(&ValidatorAddress, &Dec) -> bool,
    ) -> Result<(), StoreError> {
        {
            let mut failing = self.failing_delegation_reads.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(StoreError::Backend("staking ledger unavailable".to_string()));
            }
        }
        // Snapshot first so the callback may call back into the oracle.
        let snapshot: Vec<(ValidatorAddress, Dec)> = self
            .delegations
            .lock()
            .unwrap()
            .get(delegator)
            .map(|m| m.iter().map(|(v, s)| (v.clone(), s.clone())).collect())
            .unwrap_or_default();
        for (validator, shares) in &snapshot {
            if cb(validator, shares) {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_shares_remove_delegation() {
        let oracle = NullStakingOracle::new();
        let alice = AccountAddress::new("acc1alice");
        let v = ValidatorAddress::new("val1a");
        oracle.set_delegation(&alice, &v, Dec::from(10u64));
        assert_eq!(oracle.delegations(&alice).unwrap().len(), 1);

        oracle.set_delegation(&alice, &v, Dec::zero());
        assert!(oracle.delegations(&alice).unwrap().is_empty());
        assert_eq!(oracle.delegation(&alice, &v), Dec::zero());
    }

    #[test]
    fn injected_failures_run_out() {
        let oracle = NullStakingOracle::new();
        let alice = AccountAddress::new("acc1alice");
        oracle.fail_delegation_reads(1);
        assert!(matches!(oracle.delegations(&alice), Err(StoreError::Backend(_))));
        assert!(oracle.delegations(&alice).unwrap().is_empty());
    }

    #[test]
    fn iteration_stops_when_asked() {
        let oracle = NullStakingOracle::new();
        let alice = AccountAddress::new("acc1alice");
        oracle.set_delegation(&alice, &ValidatorAddress::new("val1a"), Dec::from(1u64));
        oracle.set_delegation(&alice, &ValidatorAddress::new("val1b"), Dec::from(2u64));

        let mut seen = 0;
        oracle
            .iterate_delegations(&alice, &mut |_, _| {
                seen += 1;
                true
            })
            .unwrap();
        assert_eq!(seen, 1);
    }
}
