//! Vote options and weighted votes.

use proxyvote_types::Dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::GovernanceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

impl VoteOption {
    pub const ALL: [VoteOption; 4] = [
        VoteOption::Yes,
        VoteOption::Abstain,
        VoteOption::No,
        VoteOption::NoWithVeto,
    ];
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoteOption::Yes => "yes",
            VoteOption::Abstain => "abstain",
            VoteOption::No => "no",
            VoteOption::NoWithVeto => "no_with_veto",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedVoteOption {
    pub option: VoteOption,
    pub weight: Dec,
}

impl WeightedVoteOption {
    pub fn new(option: VoteOption, weight: Dec) -> Self {
        Self { option, weight }
    }
}

/// A vote split across options. Weights are positive, options distinct, and
/// the weights sum to exactly one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WeightedVoteOption>", into = "Vec<WeightedVoteOption>")]
pub struct WeightedVoteOptions(Vec<WeightedVoteOption>);

impl WeightedVoteOptions {
    pub fn new(options: Vec<WeightedVoteOption>) -> Result<Self, GovernanceError> {
        if options.is_empty() {
            return Err(GovernanceError::InvalidVote("no options".to_string()));
        }
        let one = Dec::one();
        let mut total = Dec::zero();
        for (i, o) in options.iter().enumerate() {
            if o.weight.is_zero() || o.weight > one {
                return Err(GovernanceError::InvalidVote(format!(
                    "weight of {} must be in (0, 1], got {}",
                    o.option, o.weight
                )));
            }
            if options[..i].iter().any(|earlier| earlier.option == o.option) {
                return Err(GovernanceError::InvalidVote(format!(
                    "option {} appears more than once",
                    o.option
                )));
            }
            total += &o.weight;
        }
        if total != one {
            return Err(GovernanceError::InvalidVote(format!(
                "weights sum to {total}, expected 1"
            )));
        }
        Ok(Self(options))
    }

    /// The whole vote on one option.
    pub fn single(option: VoteOption) -> Self {
        Self(vec![WeightedVoteOption::new(option, Dec::one())])
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedVoteOption> {
        self.0.iter()
    }
}

impl TryFrom<Vec<WeightedVoteOption>> for WeightedVoteOptions {
    type Error = GovernanceError;

    fn try_from(options: Vec<WeightedVoteOption>) -> Result<Self, Self::Error> {
        Self::new(options)
    }
}

impl From<WeightedVoteOptions> for Vec<WeightedVoteOption> {
    fn from(options: WeightedVoteOptions) -> Self {
        options.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(option: VoteOption, weight: &str) -> WeightedVoteOption {
        WeightedVoteOption::new(option, weight.parse().unwrap())
    }

    #[test]
    fn split_vote_must_sum_to_one() {
        assert!(WeightedVoteOptions::new(vec![
            w(VoteOption::Yes, "0.6"),
            w(VoteOption::No, "0.4"),
        ])
        .is_ok());
        assert!(WeightedVoteOptions::new(vec![
            w(VoteOption::Yes, "0.6"),
            w(VoteOption::No, "0.3"),
        ])
        .is_err());
    }

    #[test]
    fn rejects_degenerate_votes() {
        assert!(WeightedVoteOptions::new(vec![]).is_err());
        assert!(WeightedVoteOptions::new(vec![
            w(VoteOption::Yes, "1"),
            w(VoteOption::No, "0"),
        ])
        .is_err());
        assert!(WeightedVoteOptions::new(vec![
            w(VoteOption::Yes, "0.5"),
            w(VoteOption::Yes, "0.5"),
        ])
        .is_err());
        assert!(WeightedVoteOptions::new(vec![w(VoteOption::Abstain, "1.5")]).is_err());
    }

    #[test]
    fn json_form_is_validated() {
        let json = r#"[{"option":"yes","weight":"0.25"},{"option":"no_with_veto","weight":"0.75"}]"#;
        let vote: WeightedVoteOptions = serde_json::from_str(json).unwrap();
        assert_eq!(vote.iter().count(), 2);
        assert_eq!(serde_json::to_string(&vote).unwrap(), json);

        let bad = r#"[{"option":"yes","weight":"0.25"}]"#;
        assert!(serde_json::from_str::<WeightedVoteOptions>(bad).is_err());
    }

    #[test]
    fn single_is_whole() {
        let vote = WeightedVoteOptions::single(VoteOption::No);
        let only: Vec<_> = vote.iter().collect();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].weight, Dec::one());
    }
}
