//! Solver session errors.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Failures reported by (or while talking to) an external solver session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The solver rejected a model or boundary setting.
    #[error("Configuration rejected: {message}")]
    Configuration { message: String },

    /// The solver diverged while iterating.
    #[error("Solver diverged: {message}")]
    Divergence { message: String },

    /// The solver did not answer within its time budget.
    #[error("Solver timed out: {message}")]
    Timeout { message: String },

    /// A field query could not be answered.
    #[error("Field query failed: {message}")]
    Query { message: String },

    /// The solver answered with something the protocol does not allow.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The session is no longer connected to a solver.
    #[error("Session closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Whether this failure is local to a single run (numerical trouble)
    /// rather than a sign that the session itself is unusable.
    pub fn is_run_failure(&self) -> bool {
        matches!(
            self,
            SessionError::Divergence { .. } | SessionError::Timeout { .. }
        )
    }
}
