use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Insufficient data for {symbol}: need {required} bars, have {available}")]
    InsufficientData {
        symbol: String,
        required: usize,
        available: usize,
    },

    #[error("Upstream batch failure: {0}")]
    UpstreamBatchFailure(String),

    #[error("Malformed reference data: {0}")]
    MalformedReferenceData(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl AppError {
    /// Whether the error only means "not enough history" and the symbol
    /// should be left out of the output.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, AppError::InsufficientData { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
