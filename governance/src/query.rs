//! Read-only queries over governor state.
//!
//! Addresses arrive as untrusted strings. Empty or malformed input is an
//! `InvalidArgument`; a well-formed address with nothing behind it is
//! `NotFound`.

use std::collections::BTreeMap;

use proxyvote_store::{KvStore, StakingOracle};
use proxyvote_types::{AccountAddress, GovernorAddress, ProposalId, TypesError};
use serde::{Deserialize, Serialize};

use crate::delegation::GovernanceDelegation;
use crate::governor::Governor;
use crate::shares::GovernorValShares;
use crate::tally::TallyResult;
use crate::vote::WeightedVoteOptions;
use crate::{GovernanceError, GovernorKeeper};

pub const DEFAULT_PAGE_LIMIT: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub offset: usize,
    /// Zero means [`DEFAULT_PAGE_LIMIT`].
    #[serde(default)]
    pub limit: usize,
}

impl PageRequest {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.limit
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_LIMIT)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of items across all pages.
    pub total: usize,
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len();
    let items = items
        .into_iter()
        .skip(page.offset)
        .take(page.effective_limit())
        .collect();
    Page { items, total }
}

fn parse_address<A>(
    raw: &str,
    what: &str,
    parse: fn(&str) -> Result<A, TypesError>,
) -> Result<A, GovernanceError> {
    if raw.trim().is_empty() {
        return Err(GovernanceError::InvalidArgument(format!("empty {what} address")));
    }
    parse(raw).map_err(|e| GovernanceError::InvalidArgument(e.to_string()))
}

impl<S: KvStore, O: StakingOracle> GovernorKeeper<S, O> {
    pub fn query_governor(&self, address: &str) -> Result<Governor, GovernanceError> {
        let address = parse_address(address, "governor", GovernorAddress::parse)?;
        self.registry()
            .get(&address)?
            .ok_or_else(|| GovernanceError::NotFound(format!("governor {address} not found")))
    }

    pub fn query_governors(&self, page: PageRequest) -> Result<Page<Governor>, GovernanceError> {
        Ok(paginate(self.registry().list_all()?, page))
    }

    pub fn query_governance_delegation(
        &self,
        delegator: &str,
    ) -> Result<GovernanceDelegation, GovernanceError> {
        let delegator = parse_address(delegator, "delegator", AccountAddress::parse)?;
        self.delegations().get(&delegator)?.ok_or_else(|| {
            GovernanceError::NotFound(format!("no governance delegation for {delegator}"))
        })
    }

    pub fn query_governance_delegations(
        &self,
        governor: &str,
        page: PageRequest,
    ) -> Result<Page<GovernanceDelegation>, GovernanceError> {
        let governor = self.query_governor(governor)?;
        Ok(paginate(self.delegations().of_governor(&governor.address)?, page))
    }

    pub fn query_governor_val_shares(
        &self,
        governor: &str,
        page: PageRequest,
    ) -> Result<Page<GovernorValShares>, GovernanceError> {
        let governor = self.query_governor(governor)?;
        Ok(paginate(self.ledger().entries(&governor.address)?, page))
    }

    /// Governor tally of `proposal` given the governor votes cast on it.
    pub fn query_tally_result(
        &self,
        proposal: ProposalId,
        votes: &BTreeMap<GovernorAddress, WeightedVoteOptions>,
    ) -> Result<TallyResult, GovernanceError> {
        Ok(self.tally_engine().tally(proposal, votes)?.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::GovernorDescription;
    use crate::vote::VoteOption;
    use crate::GovernorParams;
    use proxyvote_nullables::{NullKvStore, NullStakingOracle};
    use proxyvote_types::{Dec, Int, ValidatorAddress};

    fn keeper() -> GovernorKeeper<NullKvStore, NullStakingOracle> {
        let oracle = NullStakingOracle::new();
        let v = ValidatorAddress::new("val1v");
        oracle.set_validator(&v, Int::from(100u64), Dec::from(100u64));
        oracle.set_delegation(&AccountAddress::new("acc1alice"), &v, Dec::from(10u64));
        let params = GovernorParams {
            max_governors: 10,
            min_governor_self_delegation: "0".to_string(),
        };
        let keeper = GovernorKeeper::new(NullKvStore::new(), oracle, params);
        for name in ["alice", "bob", "carol"] {
            keeper
                .create_governor(
                    &GovernorAddress::new(format!("gov1{name}")),
                    GovernorDescription::new(name),
                )
                .unwrap();
        }
        keeper
    }

    #[test]
    fn governor_lookup_errors() {
        let keeper = keeper();
        assert_eq!(keeper.query_governor("gov1alice").unwrap().voting_power, Dec::from(10u64));
        assert!(matches!(
            keeper.query_governor(""),
            Err(GovernanceError::InvalidArgument(_))
        ));
        assert!(matches!(
            keeper.query_governor("acc1alice"),
            Err(GovernanceError::InvalidArgument(_))
        ));
        assert!(matches!(
            keeper.query_governor("gov1nobody"),
            Err(GovernanceError::NotFound(_))
        ));
    }

    #[test]
    fn governors_paginate() {
        let keeper = keeper();
        let page = keeper.query_governors(PageRequest::new(1, 1)).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].description.moniker, "bob");

        let rest = keeper.query_governors(PageRequest::new(2, 0)).unwrap();
        assert_eq!(rest.items.len(), 1);
        assert!(keeper
            .query_governors(PageRequest::new(5, 10))
            .unwrap()
            .items
            .is_empty());
    }

    #[test]
    fn delegation_queries() {
        let keeper = keeper();
        let d = keeper.query_governance_delegation("acc1alice").unwrap();
        assert!(d.is_self_delegation());
        assert!(matches!(
            keeper.query_governance_delegation("acc1dave"),
            Err(GovernanceError::NotFound(_))
        ));

        let page = keeper
            .query_governance_delegations("gov1alice", PageRequest::default())
            .unwrap();
        assert_eq!(page.total, 1);

        let shares = keeper
            .query_governor_val_shares("gov1alice", PageRequest::default())
            .unwrap();
        assert_eq!(shares.items[0].shares, Dec::from(10u64));
        assert!(matches!(
            keeper.query_governor_val_shares("gov1nobody", PageRequest::default()),
            Err(GovernanceError::NotFound(_))
        ));
    }

    #[test]
    fn tally_result_query() {
        let keeper = keeper();
        let votes: BTreeMap<_, _> = [(
            GovernorAddress::new("gov1alice"),
            WeightedVoteOptions::single(VoteOption::NoWithVeto),
        )]
        .into_iter()
        .collect();
        let result = keeper.query_tally_result(ProposalId::new(3), &votes).unwrap();
        assert_eq!(result.no_with_veto_count, Int::from(10u64));
    }
}
