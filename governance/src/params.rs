//! Governor parameters.
//!
//! These are owned by the surrounding parameter store; the engine only reads
//! them. `min_governor_self_delegation` stays a string, as it is stored, and is
//! parsed on every eligibility check.

use proxyvote_types::Int;
use serde::{Deserialize, Serialize};

use crate::GovernanceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorParams {
    /// Maximum number of eligible governors whose votes are tallied.
    #[serde(default = "default_max_governors")]
    pub max_governors: u64,

    /// Minimum bonded tokens a governor must hold to be eligible, as an
    /// integer string.
    #[serde(default = "default_min_governor_self_delegation")]
    pub min_governor_self_delegation: String,
}

fn default_max_governors() -> u64 {
    100
}

fn default_min_governor_self_delegation() -> String {
    "1000000".to_string()
}

impl GovernorParams {
    /// Parse the self-delegation floor.
    pub fn min_self_delegation(&self) -> Result<Int, GovernanceError> {
        self.min_governor_self_delegation
            .parse()
            .map_err(|_| GovernanceError::MalformedParam {
                name: "min_governor_self_delegation",
                value: self.min_governor_self_delegation.clone(),
            })
    }
}

impl Default for GovernorParams {
    fn default() -> Self {
        Self {
            max_governors: default_max_governors(),
            min_governor_self_delegation: default_min_governor_self_delegation(),
        }
    }
}
