//! Key layout of the governance keyspace.
//!
//! | prefix | key | value |
//! |---|---|---|
//! | `0x01` | name | backend metadata (schema version) |
//! | `0x20` | governor | `Governor` |
//! | `0x21` | power ‖ governor | governor address bytes |
//! | `0x22` | len ‖ governor ‖ validator | `GovernorValShares` |
//! | `0x23` | delegator | `GovernanceDelegation` |
//! | `0x24` | len ‖ governor ‖ delegator | `GovernanceDelegation` |
//! | `0x25` | proposal ‖ len ‖ governor ‖ validator | `ShareDeduction` |
//! | `0x26` | proposal ‖ delegator | `AccountAddress` of the direct voter |
//!
//! Variable-length segments that are followed by another segment carry a
//! one-byte length prefix so that a prefix scan for one governor never picks
//! up a governor whose address merely starts with the same bytes.

use proxyvote_types::{AccountAddress, GovernorAddress, Int, ProposalId, ValidatorAddress};

pub const META_PREFIX: u8 = 0x01;
pub const GOVERNOR_PREFIX: u8 = 0x20;
pub const GOVERNOR_BY_POWER_PREFIX: u8 = 0x21;
pub const VALIDATOR_SHARES_PREFIX: u8 = 0x22;
pub const GOVERNANCE_DELEGATION_PREFIX: u8 = 0x23;
pub const DELEGATIONS_BY_GOVERNOR_PREFIX: u8 = 0x24;
pub const SHARE_DEDUCTION_PREFIX: u8 = 0x25;
pub const INDEPENDENT_VOTE_PREFIX: u8 = 0x26;

fn push_len_prefixed(buf: &mut Vec<u8>, segment: &[u8]) {
    // Addresses are capped at 255 bytes by `proxyvote_types::address`.
    buf.push(segment.len() as u8);
    buf.extend_from_slice(segment);
}

pub fn meta_key(name: &str) -> Vec<u8> {
    let mut key = vec![META_PREFIX];
    key.extend_from_slice(name.as_bytes());
    key
}

pub fn governor_key(governor: &GovernorAddress) -> Vec<u8> {
    let mut key = vec![GOVERNOR_PREFIX];
    key.extend_from_slice(governor.as_bytes());
    key
}

pub fn governors_prefix() -> Vec<u8> {
    vec![GOVERNOR_PREFIX]
}

/// Power is encoded as its byte length followed by the big-endian magnitude
/// without leading zeros. A longer magnitude is always a larger number, so
/// byte order equals numeric order. Ties are broken by the address bytes.
pub fn governor_by_power_key(governor: &GovernorAddress, power: &Int) -> Vec<u8> {
    let magnitude = power.to_be_bytes();
    let mut key = vec![GOVERNOR_BY_POWER_PREFIX];
    push_len_prefixed(&mut key, &magnitude);
    key.extend_from_slice(governor.as_bytes());
    key
}

pub fn governors_by_power_prefix() -> Vec<u8> {
    vec![GOVERNOR_BY_POWER_PREFIX]
}

pub fn validator_shares_key(governor: &GovernorAddress, validator: &ValidatorAddress) -> Vec<u8> {
    let mut key = validator_shares_prefix(governor);
    key.extend_from_slice(validator.as_bytes());
    key
}

pub fn validator_shares_prefix(governor: &GovernorAddress) -> Vec<u8> {
    let mut key = vec![VALIDATOR_SHARES_PREFIX];
    push_len_prefixed(&mut key, governor.as_bytes());
    key
}

pub fn governance_delegation_key(delegator: &AccountAddress) -> Vec<u8> {
    let mut key = vec![GOVERNANCE_DELEGATION_PREFIX];
    key.extend_from_slice(delegator.as_bytes());
    key
}

pub fn delegation_by_governor_key(governor: &GovernorAddress, delegator: &AccountAddress) -> Vec<u8> {
    let mut key = delegations_by_governor_prefix(governor);
    key.extend_from_slice(delegator.as_bytes());
    key
}

pub fn delegations_by_governor_prefix(governor: &GovernorAddress) -> Vec<u8> {
    let mut key = vec![DELEGATIONS_BY_GOVERNOR_PREFIX];
    push_len_prefixed(&mut key, governor.as_bytes());
    key
}

pub fn share_deduction_key(
    proposal: ProposalId,
    governor: &GovernorAddress,
    validator: &ValidatorAddress,
) -> Vec<u8> {
    let mut key = share_deductions_by_governor_prefix(proposal, governor);
    key.extend_from_slice(validator.as_bytes());
    key
}

pub fn share_deductions_prefix(proposal: ProposalId) -> Vec<u8> {
    let mut key = vec![SHARE_DEDUCTION_PREFIX];
    key.extend_from_slice(&proposal.to_be_bytes());
    key
}

pub fn share_deductions_by_governor_prefix(
    proposal: ProposalId,
    governor: &GovernorAddress,
) -> Vec<u8> {
    let mut key = share_deductions_prefix(proposal);
    push_len_prefixed(&mut key, governor.as_bytes());
    key
}

/// Marks a delegator that voted on `proposal` directly. Its shares are
/// deducted from whichever governor it is delegated to when the deductions
/// are read.
pub fn independent_vote_key(proposal: ProposalId, delegator: &AccountAddress) -> Vec<u8> {
    let mut key = independent_votes_prefix(proposal);
    key.extend_from_slice(delegator.as_bytes());
    key
}

pub fn independent_votes_prefix(proposal: ProposalId) -> Vec<u8> {
    let mut key = vec![INDEPENDENT_VOTE_PREFIX];
    key.extend_from_slice(&proposal.to_be_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gov(name: &str) -> GovernorAddress {
        GovernorAddress::new(format!("gov1{name}"))
    }

    #[test]
    fn power_keys_sort_numerically() {
        let a = gov("a");
        let mut keys = vec![
            governor_by_power_key(&a, &Int::from(256u64)),
            governor_by_power_key(&a, &Int::zero()),
            governor_by_power_key(&a, &Int::from(255u64)),
            governor_by_power_key(&a, &Int::from(1u64 << 40)),
        ];
        keys.sort();
        assert_eq!(keys[0], governor_by_power_key(&a, &Int::zero()));
        assert_eq!(keys[1], governor_by_power_key(&a, &Int::from(255u64)));
        assert_eq!(keys[2], governor_by_power_key(&a, &Int::from(256u64)));
        assert_eq!(keys[3], governor_by_power_key(&a, &Int::from(1u64 << 40)));
    }

    #[test]
    fn governor_prefixes_do_not_overlap() {
        let short = gov("ab");
        let long = gov("abc");
        let val = ValidatorAddress::new("val1x");
        assert!(!validator_shares_key(&long, &val).starts_with(&validator_shares_prefix(&short)));
        assert!(validator_shares_key(&short, &val).starts_with(&validator_shares_prefix(&short)));
    }

    #[test]
    fn deductions_are_scoped_by_proposal() {
        let g = gov("a");
        let v = ValidatorAddress::new("val1x");
        let key = share_deduction_key(ProposalId::new(7), &g, &v);
        assert!(key.starts_with(&share_deductions_prefix(ProposalId::new(7))));
        assert!(!key.starts_with(&share_deductions_prefix(ProposalId::new(8))));
    }
}
