use thiserror::Error;
use uuid::Uuid;

/// Errors from the persistence layer. Nothing here is retried.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or TLS failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("not signed in")]
    NotSignedIn,

    #[error("analysis {id} not found")]
    NotFound { id: Uuid },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored payload is not a valid aggregate for its platform.
    #[error("invalid analysis payload: {0}")]
    Payload(#[from] ingest::IngestError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;
