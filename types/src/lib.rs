//! Fundamental types for proxyvote.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account, governor and validator addresses, proposal identifiers, and the
//! arbitrary-precision [`Dec`] / [`Int`] numerics used for shares and token amounts.

pub mod address;
pub mod amount;
pub mod decimal;
pub mod error;
pub mod proposal;

pub use address::{AccountAddress, GovernorAddress, ValidatorAddress};
pub use amount::Int;
pub use decimal::Dec;
pub use error::TypesError;
pub use proposal::ProposalId;
