//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (storage, staking ledger) are abstracted behind
//! traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem
//!
//! Usage: swap real implementations for nullables in tests.

pub mod staking;
pub mod store;

pub use staking::NullStakingOracle;
pub use store::NullKvStore;
