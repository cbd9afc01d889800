//! Error types for sweep operations.

use sf_core::SfError;
use sf_results::ResultsError;
use sf_session::SessionError;
use thiserror::Error;

/// Malformed sweep grid. Raised before any solver interaction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Invalid grid: {reason}")]
    Invalid { reason: String },

    #[error("Invalid grid: {0}")]
    Value(#[from] SfError),
}

/// Errors that abort a sweep.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error(transparent)]
    InvalidGrid(#[from] GridError),

    #[error("Invalid sweep plan: {what}")]
    Plan { what: String },

    #[error("Model setting '{name}' rejected: {source}")]
    ModelConfiguration {
        name: String,
        source: SessionError,
    },

    #[error("Boundary parameter {surface}/{key} rejected at point {point}: {source}")]
    Configuration {
        point: String,
        surface: String,
        key: String,
        source: SessionError,
    },

    #[error("Solver session failed during {stage} at point {point}: {source}")]
    Session {
        stage: &'static str,
        point: String,
        source: SessionError,
    },

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),
}

impl SweepError {
    /// True for errors caused by the solver rejecting a setting.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SweepError::ModelConfiguration { .. } | SweepError::Configuration { .. }
        )
    }
}

pub type SweepResult<T> = Result<T, SweepError>;
