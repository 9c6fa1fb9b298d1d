use thiserror::Error;

// StoreError is the lowest level error type, wrapping failures from the
// persistence layer. It does not wrap any higher level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("corrupt store document: {0}")]
    Corrupt(String),
}
