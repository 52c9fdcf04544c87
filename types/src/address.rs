//! Prefixed address types.
//!
//! Accounts, governors and validators are identified by the same kind of
//! opaque identifier; the prefix puts each in its own namespace. A governor
//! address is the account address of the same identity with the `gov1`
//! prefix, so conversion between the two never loses information.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Store keys length-prefix addresses with a single byte.
const MAX_ADDRESS_LEN: usize = 255;

fn is_well_formed(raw: &str, prefix: &str) -> bool {
    if raw.len() > MAX_ADDRESS_LEN {
        return false;
    }
    match raw.strip_prefix(prefix) {
        Some(body) => {
            !body.is_empty()
                && body
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        }
        None => false,
    }
}

macro_rules! prefixed_address {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Namespace prefix carried by every address of this kind.
            pub const PREFIX: &'static str = $prefix;

            /// Create an address from a trusted string.
            ///
            /// # Panics
            /// Panics if the string is not a well-formed address of this kind.
            /// Use [`Self::parse`] for untrusted input.
            pub fn new(raw: impl Into<String>) -> Self {
                let s = raw.into();
                assert!(
                    is_well_formed(&s, Self::PREFIX),
                    "address must start with {} and have a non-empty body",
                    Self::PREFIX
                );
                Self(s)
            }

            /// Parse an address from untrusted input.
            pub fn parse(raw: &str) -> Result<Self, TypesError> {
                if is_well_formed(raw, Self::PREFIX) {
                    Ok(Self(raw.to_string()))
                } else {
                    Err(TypesError::InvalidAddress {
                        raw: raw.to_string(),
                        expected_prefix: Self::PREFIX,
                    })
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn as_bytes(&self) -> &[u8] {
                self.0.as_bytes()
            }

            /// The identifier without its namespace prefix.
            pub fn body(&self) -> &str {
                &self.0[Self::PREFIX.len()..]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypesError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(addr: $name) -> Self {
                addr.0
            }
        }
    };
}

prefixed_address!(
    /// A plain account (token holder / delegator).
    AccountAddress,
    "acc1"
);

prefixed_address!(
    /// A governor: an account acting as a voting proxy.
    GovernorAddress,
    "gov1"
);

prefixed_address!(
    /// A validator in the underlying staking ledger.
    ValidatorAddress,
    "val1"
);

impl GovernorAddress {
    /// The governor address of the same identity as `account`.
    pub fn from_account(account: &AccountAddress) -> Self {
        Self(format!("{}{}", Self::PREFIX, account.body()))
    }

    /// The account this governor acts as when delegating to itself.
    pub fn to_account(&self) -> AccountAddress {
        AccountAddress(format!("{}{}", AccountAddress::PREFIX, self.body()))
    }
}
