use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("insufficient data: need at least {needed} cost entries, found {found}")]
    InsufficientData { needed: usize, found: usize },
    #[error("{kind} with id '{id}' not found")]
    NotFound { kind: &'static str, id: String },
}

pub type FixtureResult<T> = Result<T, FixtureError>;
