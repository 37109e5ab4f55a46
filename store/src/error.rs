use thiserror::Error;

/// Failures surfaced by a [`StakeStore`](crate::StakeStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The stored data cannot be used by this build (e.g. newer schema).
    #[error("database is unusable: {0}")]
    Corruption(String),
}
