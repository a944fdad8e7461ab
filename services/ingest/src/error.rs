use thiserror::Error;

use crate::model::Network;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("spreadsheet entry {entry}: {reason}")]
    Spreadsheet { entry: String, reason: String },

    /// The only import failure that reaches the user: nothing in the archive
    /// was recognized for the selected network.
    #[error("no valid {network} files found in archive")]
    NoValidFiles { network: Network },

    #[error("unknown network \"{0}\" (expected youtube, instagram or tiktok)")]
    UnknownNetwork(String),

    #[error("invalid date range \"{input}\": {reason}")]
    InvalidRange { input: String, reason: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;
