//! Error types for the sf-app service layer.

use sf_results::ResultTable;
use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors for frontends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Definition error: {0}")]
    Definition(String),

    #[error("Failed to read sweep definition: {path}")]
    DefinitionFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Solver session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Sweep error: {0}")]
    Sweep(String),

    /// Writing the CSV or its manifest failed. The finished table is handed
    /// back so it can be written somewhere else.
    #[error("Failed to export results to {path}: {message}")]
    Export {
        path: PathBuf,
        message: String,
        table: Box<ResultTable>,
    },

    #[error("Results error: {0}")]
    Results(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<sf_project::ProjectError> for AppError {
    fn from(err: sf_project::ProjectError) -> Self {
        AppError::Definition(err.to_string())
    }
}

impl From<sf_sweep::GridError> for AppError {
    fn from(err: sf_sweep::GridError) -> Self {
        AppError::InvalidGrid(err.to_string())
    }
}

impl From<sf_sweep::SweepError> for AppError {
    fn from(err: sf_sweep::SweepError) -> Self {
        match err {
            sf_sweep::SweepError::InvalidGrid(e) => AppError::InvalidGrid(e.to_string()),
            e if e.is_configuration() => AppError::Configuration(e.to_string()),
            e => AppError::Sweep(e.to_string()),
        }
    }
}

impl From<sf_session::SessionError> for AppError {
    fn from(err: sf_session::SessionError) -> Self {
        AppError::Session(err.to_string())
    }
}

impl From<sf_results::ResultsError> for AppError {
    fn from(err: sf_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
