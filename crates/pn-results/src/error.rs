use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Series shape mismatch: expected {expected} columns, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
}

pub type ResultsResult<T> = Result<T, ResultsError>;
