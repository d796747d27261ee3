use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Remote match source unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Rate limit exceeded, please try again later")]
    RateLimited,

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Cache store error: {0}")]
    PersistenceFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Reconciliation worker failed: {0}")]
    WorkerFailed(String),
}

impl AppError {
    /// Failures talking to the match source. These are retried on the next
    /// reconciliation instead of being recorded.
    pub fn is_remote(&self) -> bool {
        matches!(self, AppError::RemoteUnavailable(_) | AppError::RateLimited)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::PersistenceFailure(e.to_string())
    }
}
