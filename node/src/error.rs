use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] rollcall_store_lmdb::LmdbError),

    #[error("store error: {0}")]
    Store(#[from] rollcall_store::StoreError),

    #[error("queue error: {0}")]
    Queue(#[from] rollcall_submission::QueueError),

    #[error("could not queue verified claim: {0}")]
    Intake(#[from] rollcall_submission::IntakeError),

    #[error("signing failed: {0}")]
    Sign(#[from] rollcall_submission::SignError),

    #[error("relay error: {0}")]
    Relay(#[from] rollcall_submission::RelayError),

    #[error("invalid trusted issuer: {0}")]
    Issuer(#[from] rollcall_types::TypeError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
