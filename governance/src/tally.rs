//! Governor tally.
//!
//! For a proposal, walk the top `max_governors` eligible governors by power.
//! Each one that voted contributes the token value of its shares, less the
//! deductions recorded for the proposal, split across its vote options by
//! weight. Per-option sums are kept as decimals and truncated only at the end.
//!
//! The tally reads the store and never writes it.

use std::collections::BTreeMap;

use proxyvote_store::{KvStore, StakingOracle};
use proxyvote_types::{Dec, GovernorAddress, Int, ProposalId, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::deduction::DeductionBook;
use crate::eligibility::EligibilityGate;
use crate::registry::GovernorRegistry;
use crate::shares::ShareLedger;
use crate::vote::{VoteOption, WeightedVoteOptions};
use crate::{GovernanceError, GovernorParams};

/// Everything the tally needs about one governor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GovernorGovInfo {
    pub address: GovernorAddress,
    pub shares: BTreeMap<ValidatorAddress, Dec>,
    pub deductions: BTreeMap<ValidatorAddress, Dec>,
    pub vote: WeightedVoteOptions,
    /// Power as stored on the governor, before deductions.
    pub voting_power: Dec,
}

impl GovernorGovInfo {
    /// Shares minus deductions, per validator, never below zero.
    pub fn effective_shares(&self) -> BTreeMap<ValidatorAddress, Dec> {
        self.shares
            .iter()
            .filter_map(|(validator, shares)| {
                let effective = match self.deductions.get(validator) {
                    Some(deduction) => shares.saturating_sub(deduction),
                    None => shares.clone(),
                };
                (!effective.is_zero()).then(|| (validator.clone(), effective))
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub yes_count: Int,
    pub abstain_count: Int,
    pub no_count: Int,
    pub no_with_veto_count: Int,
}

impl TallyResult {
    pub fn empty() -> Self {
        Self {
            yes_count: Int::zero(),
            abstain_count: Int::zero(),
            no_count: Int::zero(),
            no_with_veto_count: Int::zero(),
        }
    }

    /// Truncate accumulated per-option decimals.
    pub fn from_totals(totals: &BTreeMap<VoteOption, Dec>) -> Self {
        let count = |option: VoteOption| {
            totals
                .get(&option)
                .map(Dec::truncate_int)
                .unwrap_or_default()
        };
        Self {
            yes_count: count(VoteOption::Yes),
            abstain_count: count(VoteOption::Abstain),
            no_count: count(VoteOption::No),
            no_with_veto_count: count(VoteOption::NoWithVeto),
        }
    }

    pub fn count(&self, option: VoteOption) -> &Int {
        match option {
            VoteOption::Yes => &self.yes_count,
            VoteOption::Abstain => &self.abstain_count,
            VoteOption::No => &self.no_count,
            VoteOption::NoWithVeto => &self.no_with_veto_count,
        }
    }

    pub fn total(&self) -> Int {
        VoteOption::ALL
            .iter()
            .fold(Int::zero(), |acc, option| acc + self.count(*option).clone())
    }
}

impl Default for TallyResult {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub result: TallyResult,
    /// Effective power of every governor that voted.
    pub total_voting_power: Int,
    pub governors_counted: u64,
}

pub struct TallyEngine<'a, S, O> {
    store: &'a S,
    oracle: &'a O,
    params: &'a GovernorParams,
}

impl<'a, S: KvStore, O: StakingOracle> TallyEngine<'a, S, O> {
    pub fn new(store: &'a S, oracle: &'a O, params: &'a GovernorParams) -> Self {
        Self {
            store,
            oracle,
            params,
        }
    }

    /// Tally the governor votes cast on `proposal`.
    pub fn tally(
        &self,
        proposal: ProposalId,
        votes: &BTreeMap<GovernorAddress, WeightedVoteOptions>,
    ) -> Result<Tally, GovernanceError> {
        let infos = self.governor_infos(proposal, votes)?;
        let tally = self.tally_infos(&infos)?;
        tracing::debug!(
            proposal = %proposal,
            governors = tally.governors_counted,
            total_power = %tally.total_voting_power,
            yes = %tally.result.yes_count,
            no = %tally.result.no_count,
            "governor tally computed"
        );
        Ok(tally)
    }

    /// Collect the eligible governors that voted, strongest first.
    ///
    /// An eligible governor without a vote takes a slot in the top
    /// `max_governors` but yields no info.
    pub fn governor_infos(
        &self,
        proposal: ProposalId,
        votes: &BTreeMap<GovernorAddress, WeightedVoteOptions>,
    ) -> Result<Vec<GovernorGovInfo>, GovernanceError> {
        let registry = GovernorRegistry::new(self.store);
        let gate = EligibilityGate::new(self.store, self.oracle, self.params);
        let ledger = ShareLedger::new(self.store, self.oracle);
        let mut deductions = DeductionBook::new(self.store, self.oracle).by_governor(proposal)?;

        let mut infos = Vec::new();
        registry.iterate_top_by_power(
            self.params.max_governors,
            |governor| gate.is_eligible(governor),
            |_, governor| {
                let Some(vote) = votes.get(&governor.address) else {
                    tracing::trace!(governor = %governor.address, "no vote cast");
                    return Ok(false);
                };
                infos.push(GovernorGovInfo {
                    address: governor.address.clone(),
                    shares: ledger.validator_shares(&governor.address)?,
                    deductions: deductions.remove(&governor.address).unwrap_or_default(),
                    vote: vote.clone(),
                    voting_power: governor.voting_power.clone(),
                });
                Ok(false)
            },
        )?;
        Ok(infos)
    }

    /// Accumulate `infos` into a result.
    pub fn tally_infos(&self, infos: &[GovernorGovInfo]) -> Result<Tally, GovernanceError> {
        let ledger = ShareLedger::new(self.store, self.oracle);
        let mut totals: BTreeMap<VoteOption, Dec> = BTreeMap::new();
        let mut total_voting_power = Int::zero();

        for info in infos {
            let power = ledger.tokens_for_shares(&info.effective_shares())?;
            if power.is_zero() {
                continue;
            }
            let power_dec = Dec::from_int(&power);
            for weighted in info.vote.iter() {
                *totals.entry(weighted.option).or_default() += &power_dec.mul_truncate(&weighted.weight);
            }
            total_voting_power += &power;
        }

        Ok(Tally {
            result: TallyResult::from_totals(&totals),
            total_voting_power,
            governors_counted: infos.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::{GovernorDescription, GovernorStatus};
    use crate::vote::WeightedVoteOption;
    use crate::GovernorKeeper;
    use proxyvote_nullables::{NullKvStore, NullStakingOracle};
    use proxyvote_store::keys;
    use proxyvote_types::AccountAddress;

    type Keeper = GovernorKeeper<NullKvStore, NullStakingOracle>;

    fn gov(name: &str) -> GovernorAddress {
        GovernorAddress::new(format!("gov1{name}"))
    }

    fn acc(name: &str) -> AccountAddress {
        AccountAddress::new(format!("acc1{name}"))
    }

    fn val() -> ValidatorAddress {
        ValidatorAddress::new("val1v")
    }

    /// Validator `val1v` with 2000 bonded tokens over 1000 shares.
    fn keeper(max_governors: u64, floor: &str) -> Keeper {
        let oracle = NullStakingOracle::new();
        oracle.set_validator(&val(), Int::from(2000u64), Dec::from(1000u64));
        let params = GovernorParams {
            max_governors,
            min_governor_self_delegation: floor.to_string(),
        };
        GovernorKeeper::new(NullKvStore::new(), oracle, params)
    }

    fn governor_with_shares(keeper: &Keeper, name: &str, shares: u64) {
        keeper
            .oracle()
            .set_delegation(&acc(name), &val(), Dec::from(shares));
        keeper
            .create_governor(&gov(name), GovernorDescription::new(name))
            .unwrap();
    }

    fn all_yes(names: &[&str]) -> BTreeMap<GovernorAddress, WeightedVoteOptions> {
        names
            .iter()
            .map(|n| (gov(n), WeightedVoteOptions::single(VoteOption::Yes)))
            .collect()
    }

    #[test]
    fn empty_results_are_equal() {
        assert_eq!(TallyResult::empty(), TallyResult::empty());
        assert_eq!(TallyResult::empty().total(), Int::zero());
        assert_eq!(
            serde_json::to_string(&TallyResult::empty()).unwrap(),
            r#"{"yes_count":"0","abstain_count":"0","no_count":"0","no_with_veto_count":"0"}"#
        );
    }

    #[test]
    fn single_governor_full_yes() {
        let keeper = keeper(100, "0");
        governor_with_shares(&keeper, "alice", 1000);
        assert_eq!(
            keeper.ledger().compute_bonded_tokens(&gov("alice")).unwrap(),
            Int::from(2000u64)
        );

        let tally = keeper
            .tally_engine()
            .tally(ProposalId::new(1), &all_yes(&["alice"]))
            .unwrap();
        assert_eq!(tally.result.yes_count, Int::from(2000u64));
        assert_eq!(tally.total_voting_power, Int::from(2000u64));
        assert_eq!(tally.governors_counted, 1);
    }

    #[test]
    fn deductions_reduce_effective_power() {
        let keeper = keeper(100, "0");
        governor_with_shares(&keeper, "alice", 1000);
        keeper
            .deductions()
            .add_deduction(ProposalId::new(1), &gov("alice"), &val(), &Dec::from(400u64))
            .unwrap();

        let tally = keeper
            .tally_engine()
            .tally(ProposalId::new(1), &all_yes(&["alice"]))
            .unwrap();
        assert_eq!(tally.result.yes_count, Int::from(1200u64));

        // Other proposals are unaffected.
        let other = keeper
            .tally_engine()
            .tally(ProposalId::new(2), &all_yes(&["alice"]))
            .unwrap();
        assert_eq!(other.result.yes_count, Int::from(2000u64));
    }

    #[test]
    fn direct_voter_moving_governors_is_counted_once() {
        let keeper = keeper(100, "0");
        governor_with_shares(&keeper, "alice", 100);
        governor_with_shares(&keeper, "bob", 100);
        keeper
            .oracle()
            .set_delegation(&acc("dave"), &val(), Dec::from(30u64));
        keeper.delegate_governance(&acc("dave"), &gov("alice")).unwrap();

        let p = ProposalId::new(1);
        keeper.deductions().record_independent_vote(p, &acc("dave")).unwrap();
        keeper.delegate_governance(&acc("dave"), &gov("bob")).unwrap();

        let votes: BTreeMap<_, _> = [
            (gov("alice"), WeightedVoteOptions::single(VoteOption::Yes)),
            (gov("bob"), WeightedVoteOptions::single(VoteOption::No)),
        ]
        .into_iter()
        .collect();
        let tally = keeper.tally_engine().tally(p, &votes).unwrap();
        assert_eq!(tally.result.yes_count, Int::from(200u64));
        assert_eq!(tally.result.no_count, Int::from(200u64));

        // More stake for dave raises bob's power but not bob's tally.
        keeper
            .oracle()
            .set_delegation(&acc("dave"), &val(), Dec::from(60u64));
        keeper
            .on_staking_shares_changed(&acc("dave"), &val(), &Dec::from(30u64), &Dec::from(60u64))
            .unwrap();
        assert_eq!(
            keeper.registry().get(&gov("bob")).unwrap().unwrap().voting_power,
            Dec::from(320u64)
        );
        let tally = keeper.tally_engine().tally(p, &votes).unwrap();
        assert_eq!(tally.result.yes_count, Int::from(200u64));
        assert_eq!(tally.result.no_count, Int::from(200u64));
    }

    #[test]
    fn deductions_never_go_negative() {
        let info = GovernorGovInfo {
            address: gov("alice"),
            shares: [(val(), Dec::from(10u64))].into_iter().collect(),
            deductions: [(val(), Dec::from(25u64))].into_iter().collect(),
            vote: WeightedVoteOptions::single(VoteOption::Yes),
            voting_power: Dec::from(20u64),
        };
        assert!(info.effective_shares().is_empty());

        let keeper = keeper(100, "0");
        let tally = keeper.tally_engine().tally_infos(&[info]).unwrap();
        assert_eq!(tally.result, TallyResult::empty());
        assert_eq!(tally.governors_counted, 1);
    }

    #[test]
    fn missing_self_delegation_aborts_the_tally() {
        let keeper = keeper(100, "0");
        governor_with_shares(&keeper, "alice", 1000);
        keeper
            .store()
            .delete(&keys::governance_delegation_key(&acc("alice")))
            .unwrap();

        let result = keeper
            .tally_engine()
            .tally(ProposalId::new(1), &all_yes(&["alice"]));
        assert!(matches!(result, Err(GovernanceError::InvariantViolation(_))));
    }

    #[test]
    fn only_the_top_governors_count() {
        let keeper = keeper(2, "0");
        governor_with_shares(&keeper, "a", 150);
        governor_with_shares(&keeper, "b", 100);
        governor_with_shares(&keeper, "c", 50);

        let infos = keeper
            .tally_engine()
            .governor_infos(ProposalId::new(1), &all_yes(&["a", "b", "c"]))
            .unwrap();
        let powers: Vec<_> = infos.iter().map(|i| i.voting_power.clone()).collect();
        assert_eq!(powers, vec![Dec::from(300u64), Dec::from(200u64)]);

        let tally = keeper
            .tally_engine()
            .tally(ProposalId::new(1), &all_yes(&["a", "b", "c"]))
            .unwrap();
        assert_eq!(tally.result.yes_count, Int::from(500u64));
    }

    #[test]
    fn silent_governors_are_not_abstentions() {
        let keeper = keeper(100, "0");
        governor_with_shares(&keeper, "a", 150);
        governor_with_shares(&keeper, "b", 100);

        let tally = keeper
            .tally_engine()
            .tally(ProposalId::new(1), &all_yes(&["b"]))
            .unwrap();
        assert_eq!(tally.result.yes_count, Int::from(200u64));
        assert!(tally.result.abstain_count.is_zero());
        assert_eq!(tally.governors_counted, 1);
    }

    #[test]
    fn ineligible_and_inactive_governors_are_skipped() {
        let keeper = keeper(100, "250");
        governor_with_shares(&keeper, "a", 150);
        governor_with_shares(&keeper, "b", 100);
        governor_with_shares(&keeper, "c", 200);
        keeper
            .update_governor_status(&gov("c"), GovernorStatus::Inactive)
            .unwrap();

        let tally = keeper
            .tally_engine()
            .tally(ProposalId::new(1), &all_yes(&["a", "b", "c"]))
            .unwrap();
        assert_eq!(tally.result.yes_count, Int::from(300u64));
        assert_eq!(tally.governors_counted, 1);
    }

    #[test]
    fn split_votes_truncate_at_the_end() {
        let keeper = keeper(100, "0");
        // 1 share -> 2 tokens each.
        governor_with_shares(&keeper, "a", 1);
        governor_with_shares(&keeper, "b", 1);

        let third: Dec = "0.333333333333333333".parse().unwrap();
        let rest: Dec = "0.666666666666666667".parse().unwrap();
        let split = WeightedVoteOptions::new(vec![
            WeightedVoteOption::new(VoteOption::Yes, third),
            WeightedVoteOption::new(VoteOption::No, rest),
        ])
        .unwrap();
        let votes: BTreeMap<_, _> = [(gov("a"), split.clone()), (gov("b"), split)]
            .into_iter()
            .collect();

        let tally = keeper.tally_engine().tally(ProposalId::new(1), &votes).unwrap();
        // Summed over both governors, yes is 1.33.. and no is 2.66..
        assert_eq!(tally.result.yes_count, Int::from(1u64));
        assert_eq!(tally.result.no_count, Int::from(2u64));
        assert!(tally.result.total() <= tally.total_voting_power);
    }

    #[test]
    fn tally_leaves_the_store_untouched() {
        let keeper = keeper(100, "0");
        governor_with_shares(&keeper, "a", 10);
        keeper
            .deductions()
            .add_deduction(ProposalId::new(1), &gov("a"), &val(), &Dec::from(4u64))
            .unwrap();
        let before = keeper.store().len();
        keeper
            .tally_engine()
            .tally(ProposalId::new(1), &all_yes(&["a"]))
            .unwrap();
        assert_eq!(keeper.store().len(), before);
        assert_eq!(
            keeper.ledger().get_shares(&gov("a"), &val()).unwrap(),
            Dec::from(10u64)
        );
    }
}
