//! Minimum self-delegation gate.

use proxyvote_store::{KvStore, StakingOracle};

use crate::delegation::GovernanceDelegations;
use crate::governor::Governor;
use crate::shares::ShareLedger;
use crate::{GovernanceError, GovernorParams};

pub struct EligibilityGate<'a, S, O> {
    store: &'a S,
    oracle: &'a O,
    params: &'a GovernorParams,
}

impl<'a, S: KvStore, O: StakingOracle> EligibilityGate<'a, S, O> {
    pub fn new(store: &'a S, oracle: &'a O, params: &'a GovernorParams) -> Self {
        Self {
            store,
            oracle,
            params,
        }
    }

    /// Whether `governor` may have its vote counted.
    ///
    /// Inactive governors are never eligible. An active governor whose own
    /// account is not delegated to itself means the store is corrupt; that is
    /// an error, not `false`.
    pub fn is_eligible(&self, governor: &Governor) -> Result<bool, GovernanceError> {
        if !governor.is_active() {
            return Ok(false);
        }

        let account = governor.address.to_account();
        let self_delegated = GovernanceDelegations::new(self.store)
            .get(&account)?
            .is_some_and(|d| d.governor_address == governor.address);
        if !self_delegated {
            tracing::warn!(governor = %governor.address, "active governor without self-delegation");
            return Err(GovernanceError::InvariantViolation(format!(
                "active governor {} is not delegated to itself",
                governor.address
            )));
        }

        let bonded = ShareLedger::new(self.store, self.oracle).compute_bonded_tokens(&governor.address)?;
        let floor = self.params.min_self_delegation()?;
        let eligible = bonded >= floor;
        tracing::trace!(
            governor = %governor.address,
            bonded = %bonded,
            floor = %floor,
            eligible,
            "eligibility checked"
        );
        Ok(eligible)
    }
}
