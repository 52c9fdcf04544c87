//! Abstract storage contracts for proxyvote.
//!
//! Every storage backend (LMDB, in-memory for testing) implements [`KvStore`].
//! The rest of the codebase depends only on the trait and on the key layout
//! in [`keys`]. The read-only view of the underlying staking ledger,
//! [`StakingOracle`], lives here as well since it is the other external
//! collaborator the governance engine reads from.

pub mod codec;
pub mod error;
pub mod keys;
pub mod kv;
pub mod staking;

pub use error::StoreError;
pub use kv::{prefix_end, BatchOp, IterDirection, KvStore, WriteBatch};
pub use staking::{StakingOracle, ValidatorInfo};
