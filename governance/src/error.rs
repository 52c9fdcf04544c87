use proxyvote_store::StoreError;
use proxyvote_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("governor {0} not found")]
    GovernorNotFound(String),

    #[error("governor {0} already exists")]
    GovernorExists(String),

    #[error("governor {0} is not active")]
    GovernorInactive(String),

    #[error("governor {governor} already has status {status}")]
    StatusUnchanged { governor: String, status: String },

    #[error("invalid governor description: {0}")]
    InvalidDescription(String),

    #[error("no governance delegation for {0}")]
    DelegationNotFound(String),

    #[error("{0} is an active governor and cannot delegate to another governor")]
    GovernorCannotDelegate(String),

    #[error("active governor {0} must keep its self-delegation")]
    SelfDelegationRequired(String),

    #[error("invalid weighted vote: {0}")]
    InvalidVote(String),

    /// State that can only come from a corrupted transition elsewhere. Fatal
    /// for the enclosing computation.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("malformed parameter {name}: {value:?}")]
    MalformedParam { name: &'static str, value: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Types(#[from] TypesError),
}
