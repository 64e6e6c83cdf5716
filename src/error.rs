//! Error types.
//!
//! - `PipelineError`: the only failures the assembly pipeline lets escape.
//! - `ProviderError`: per-series fetch failures; recovered into `FetchOutcome`.
//! - `AppError`: what the binary reports (message + process exit code).

use thiserror::Error;

/// Errors raised to the caller of the assembly pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("unknown maturity '{0}' (expected one of: {known})", known = crate::domain::all_keys().join(", "))]
    UnknownMaturity(String),

    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error("no maturities requested")]
    NoMaturities,
}

/// Failure fetching a single series from the data provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("failed to parse provider response: {0}")]
    Parse(String),

    #[error("missing FRED API key")]
    MissingCredential,
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingCredential => {
                AppError::new(2, "Missing FRED_API_KEY (set it in .env or the config file).")
            }
            other => AppError::new(4, format!("FRED {other}")),
        }
    }
}
