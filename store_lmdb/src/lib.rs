//! LMDB storage backend for proxyvote.
//!
//! Implements [`proxyvote_store::KvStore`] using the `heed` LMDB bindings.
//! The whole governance keyspace lives in one named database; the key
//! prefixes from `proxyvote_store::keys` partition it.

pub mod environment;
pub mod error;
pub mod kv;
pub mod migration;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use kv::LmdbKvStore;
