use config::ConfigError;
use thiserror::Error;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Rejected locally before any remote call was made.
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Upload error: {0}")]
    Upload(String),
    #[error("Stage error: {0}")]
    Stage(String),
    /// The remote call could not complete: connectivity, timeout, status or body.
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Score fetch error: {0}")]
    ScoreFetch(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl AppError {
    /// Whether re-triggering the same control may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AppError::Validation(_) | AppError::InvalidTransition(_) | AppError::Config(_)
        )
    }
}
