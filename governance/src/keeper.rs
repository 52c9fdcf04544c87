//! Governor keeper: owns the store, the staking oracle and the parameters,
//! and hands out the components that operate on them.

use proxyvote_store::{KvStore, StakingOracle, WriteBatch};
use proxyvote_types::{Dec, GovernorAddress};

use crate::deduction::DeductionBook;
use crate::delegation::GovernanceDelegations;
use crate::eligibility::EligibilityGate;
use crate::governor::{Governor, GovernorDescription, GovernorStatus};
use crate::registry::{stage_power_index, GovernorRegistry};
use crate::shares::ShareLedger;
use crate::tally::TallyEngine;
use crate::{GovernanceError, GovernorParams};

pub struct GovernorKeeper<S, O> {
    store: S,
    oracle: O,
    params: GovernorParams,
}

impl<S, O> GovernorKeeper<S, O> {
    pub fn new(store: S, oracle: O, params: GovernorParams) -> Self {
        Self {
            store,
            oracle,
            params,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn params(&self) -> &GovernorParams {
        &self.params
    }

    pub fn set_params(&mut self, params: GovernorParams) {
        self.params = params;
    }
}

impl<S: KvStore, O: StakingOracle> GovernorKeeper<S, O> {
    pub fn registry(&self) -> GovernorRegistry<'_, S> {
        GovernorRegistry::new(&self.store)
    }

    pub fn ledger(&self) -> ShareLedger<'_, S, O> {
        ShareLedger::new(&self.store, &self.oracle)
    }

    pub fn delegations(&self) -> GovernanceDelegations<'_, S> {
        GovernanceDelegations::new(&self.store)
    }

    pub fn deductions(&self) -> DeductionBook<'_, S, O> {
        DeductionBook::new(&self.store, &self.oracle)
    }

    pub fn eligibility(&self) -> EligibilityGate<'_, S, O> {
        EligibilityGate::new(&self.store, &self.oracle, &self.params)
    }

    pub fn tally_engine(&self) -> TallyEngine<'_, S, O> {
        TallyEngine::new(&self.store, &self.oracle, &self.params)
    }

    fn require_governor(&self, address: &GovernorAddress) -> Result<Governor, GovernanceError> {
        self.registry()
            .get(address)?
            .ok_or_else(|| GovernanceError::GovernorNotFound(address.to_string()))
    }

    /// Register a new active governor and delegate its own account to it.
    ///
    /// If the account was delegated to another governor, that delegation is
    /// moved over. The governor, its self-delegation and its shares are
    /// written together.
    pub fn create_governor(
        &self,
        address: &GovernorAddress,
        description: GovernorDescription,
    ) -> Result<Governor, GovernanceError> {
        description.validate()?;
        if self.registry().get(address)?.is_some() {
            return Err(GovernanceError::GovernorExists(address.to_string()));
        }

        let mut batch = WriteBatch::new();
        let governor = self
            .stage_delegation(
                &mut batch,
                &address.to_account(),
                Governor::new(address.clone(), description),
                None,
            )?
            .ok_or_else(|| {
                GovernanceError::InvariantViolation(format!(
                    "account of new governor {address} is already delegated to it"
                ))
            })?;
        self.store.commit(batch)?;

        tracing::info!(governor = %address, power = %governor.voting_power, "governor created");
        Ok(governor)
    }

    /// Replace the description. Status and power are untouched.
    pub fn edit_governor(
        &self,
        address: &GovernorAddress,
        description: GovernorDescription,
    ) -> Result<Governor, GovernanceError> {
        description.validate()?;
        let mut governor = self.require_governor(address)?;
        governor.description = description;
        self.registry().set(&governor)?;
        Ok(governor)
    }

    /// Move a governor between `Active` and `Inactive`.
    ///
    /// Reactivation puts the self-delegation back in place in the same
    /// batch as the status; deactivation leaves every delegation as it is.
    pub fn update_governor_status(
        &self,
        address: &GovernorAddress,
        status: GovernorStatus,
    ) -> Result<Governor, GovernanceError> {
        let mut governor = self.require_governor(address)?;
        if governor.status == status {
            return Err(GovernanceError::StatusUnchanged {
                governor: address.to_string(),
                status: status.to_string(),
            });
        }
        let stored = governor.clone();
        governor.status = status;
        let mut batch = WriteBatch::new();
        let staged = match status {
            GovernorStatus::Active => {
                self.stage_delegation(&mut batch, &address.to_account(), governor.clone(), Some(&stored))?
            }
            GovernorStatus::Inactive => None,
        };
        if staged.is_none() {
            stage_power_index(&mut batch, Some(&stored), &governor)?;
        }
        self.store.commit(batch)?;

        tracing::info!(governor = %address, status = %status, "governor status changed");
        self.require_governor(address)
    }

    /// Recompute voting power from the share ledger and re-index.
    pub fn refresh_voting_power(&self, address: &GovernorAddress) -> Result<Governor, GovernanceError> {
        let mut governor = self.require_governor(address)?;
        let tokens = self.ledger().compute_bonded_tokens(address)?;
        governor.voting_power = Dec::from_int(&tokens);
        self.registry().update_power_index(&governor)?;
        Ok(governor)
    }

    /// The governors a tally would count, strongest first.
    pub fn top_governors(&self) -> Result<Vec<Governor>, GovernanceError> {
        let gate = self.eligibility();
        let mut out = Vec::new();
        self.registry().iterate_top_by_power(
            self.params.max_governors,
            |g| gate.is_eligible(g),
            |_, g| {
                out.push(g.clone());
                Ok(false)
            },
        )?;
        Ok(out)
    }
}
