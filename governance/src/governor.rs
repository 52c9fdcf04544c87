//! The governor entity.

use proxyvote_types::{Dec, GovernorAddress, Int};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::GovernanceError;

pub const MAX_MONIKER_LEN: usize = 70;
pub const MAX_IDENTITY_LEN: usize = 3000;
pub const MAX_WEBSITE_LEN: usize = 140;
pub const MAX_SECURITY_CONTACT_LEN: usize = 140;
pub const MAX_DETAILS_LEN: usize = 280;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GovernorStatus {
    Active,
    Inactive,
}

impl fmt::Display for GovernorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernorStatus::Active => f.write_str("active"),
            GovernorStatus::Inactive => f.write_str("inactive"),
        }
    }
}

/// Human-readable metadata a governor publishes about itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorDescription {
    pub moniker: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub security_contact: String,
    #[serde(default)]
    pub details: String,
}

impl GovernorDescription {
    pub fn new(moniker: impl Into<String>) -> Self {
        Self {
            moniker: moniker.into(),
            ..Self::default()
        }
    }

    /// Check field lengths. Lengths are counted in characters.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.moniker.trim().is_empty() {
            return Err(GovernanceError::InvalidDescription(
                "moniker cannot be empty".to_string(),
            ));
        }
        let fields = [
            ("moniker", &self.moniker, MAX_MONIKER_LEN),
            ("identity", &self.identity, MAX_IDENTITY_LEN),
            ("website", &self.website, MAX_WEBSITE_LEN),
            ("security_contact", &self.security_contact, MAX_SECURITY_CONTACT_LEN),
            ("details", &self.details, MAX_DETAILS_LEN),
        ];
        for (name, value, max) in fields {
            let len = value.chars().count();
            if len > max {
                return Err(GovernanceError::InvalidDescription(format!(
                    "{name} is {len} characters, maximum is {max}"
                )));
            }
        }
        Ok(())
    }
}

/// A proxy representative that votes with the stake of the accounts
/// delegating to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Governor {
    pub address: GovernorAddress,
    pub status: GovernorStatus,
    pub description: GovernorDescription,
    /// Derived from the share ledger; only ever written through
    /// [`crate::GovernorKeeper::refresh_voting_power`].
    pub voting_power: Dec,
}

impl Governor {
    /// A new, active governor with no voting power yet.
    pub fn new(address: GovernorAddress, description: GovernorDescription) -> Self {
        Self {
            address,
            status: GovernorStatus::Active,
            description,
            voting_power: Dec::zero(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == GovernorStatus::Active
    }

    pub fn is_inactive(&self) -> bool {
        self.status == GovernorStatus::Inactive
    }

    /// The power the index is keyed by.
    pub fn power_key_value(&self) -> Int {
        self.voting_power.truncate_int()
    }
}
