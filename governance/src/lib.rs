//! Delegation-weighted governor voting.
//!
//! Accounts hand their voting rights to governors. A governor's voting power
//! is the token value of the staking shares of everyone delegating to it,
//! kept per validator in the share ledger. Governors are indexed by power;
//! a tally walks the strongest eligible governors, subtracts the shares of
//! delegators who voted for themselves, and splits each governor's power
//! across its weighted vote.
//!
//! Everything persistent goes through [`proxyvote_store::KvStore`]; stake
//! comes from a [`proxyvote_store::StakingOracle`].

pub mod deduction;
pub mod delegation;
pub mod eligibility;
pub mod error;
pub mod governor;
pub mod keeper;
pub mod params;
pub mod query;
pub mod registry;
pub mod shares;
pub mod tally;
pub mod vote;

pub use deduction::{DeductionBook, GovernorDeductions, ShareDeduction};
pub use delegation::{GovernanceDelegation, GovernanceDelegations};
pub use eligibility::EligibilityGate;
pub use error::GovernanceError;
pub use governor::{Governor, GovernorDescription, GovernorStatus};
pub use keeper::GovernorKeeper;
pub use params::GovernorParams;
pub use query::{Page, PageRequest};
pub use registry::GovernorRegistry;
pub use shares::{GovernorValShares, ShareChange, ShareLedger};
pub use tally::{GovernorGovInfo, Tally, TallyEngine, TallyResult};
pub use vote::{VoteOption, WeightedVoteOption, WeightedVoteOptions};
