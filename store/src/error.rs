use thiserror::Error;

/// Failures of the governance keyspace or of the staking ledger behind it.
///
/// Absent entries are not errors: reads return `Ok(None)` and callers decide
/// what absence means.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend (LMDB, the staking ledger) could not serve the request.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A value could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored value or index entry does not decode, or points at a record
    /// that is not there.
    #[error("governance store is corrupted: {0}")]
    Corruption(String),
}
