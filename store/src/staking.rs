//! Read-only view of the underlying staking ledger.

use proxyvote_types::{AccountAddress, Dec, Int, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// The two validator figures needed to turn shares into tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub bonded_tokens: Int,
    pub delegator_shares: Dec,
}

impl ValidatorInfo {
    /// `floor(shares * bonded_tokens / delegator_shares)`.
    ///
    /// A validator with no delegator shares has no delegators, so there is
    /// nothing to attribute and the result is zero.
    pub fn tokens_from_shares(&self, shares: &Dec) -> Int {
        shares
            .mul_int_quo_floor(&self.bonded_tokens, &self.delegator_shares)
            .unwrap_or_default()
    }
}

/// Staking ledger as seen by the governance engine.
pub trait StakingOracle {
    /// Bonded tokens and total delegator shares of a validator, if it exists.
    fn validator(&self, address: &ValidatorAddress) -> Result<Option<ValidatorInfo>, StoreError>;

    /// Visit every staking delegation of `delegator` as `(validator, shares)`.
    /// The callback returns `true` to stop early.
    fn iterate_delegations(
        &self,
        delegator: &AccountAddress,
        cb: &mut dyn FnMut(&ValidatorAddress, &Dec) -> bool,
    ) -> Result<(), StoreError>;

    /// All staking delegations of `delegator`.
    fn delegations(&self, delegator: &AccountAddress) -> Result<Vec<(ValidatorAddress, Dec)>, StoreError> {
        let mut out = Vec::new();
        self.iterate_delegations(delegator, &mut |validator, shares| {
            out.push((validator.clone(), shares.clone()));
            false
        })?;
        Ok(out)
    }
}

impl<T: StakingOracle + ?Sized> StakingOracle for &T {
    fn validator(&self, address: &ValidatorAddress) -> Result<Option<ValidatorInfo>, StoreError> {
        (**self).validator(address)
    }

    fn iterate_delegations(
        &self,
        delegator: &AccountAddress,
        cb: &mut dyn FnMut(&ValidatorAddress, &Dec) -> bool,
    ) -> Result<(), StoreError> {
        (**self).iterate_delegations(delegator, cb)
    }
}
