use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Precondition violation: {0}")]
    Precondition(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Cache error: {0}")]
    Cache(String),
}
