use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum AtkError {
    #[error("{0}")]
    Validation(String),

    #[error("User not found: {0}")]
    SubjectNotFound(String),

    #[error("You've already reported within the last 24 hours (last report at {last_submission}).")]
    AlreadyReported { last_submission: DateTime<Utc> },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Image storage failed: {0}")]
    ImageStore(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AtkResult<T> = std::result::Result<T, AtkError>;
