use proxyvote_governance::GovernanceError;
use proxyvote_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),
}
