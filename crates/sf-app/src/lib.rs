//! Shared application service layer for sweepflow.
//!
//! Centralizes definition loading, compilation of a definition into a grid
//! and sweep plan, scoped solver session handling, and result persistence,
//! so frontends only parse arguments and render progress.

pub mod compile;
pub mod definition_service;
pub mod error;
pub mod sweep_service;

pub use compile::{CompiledSweep, compile_definition, compile_grid, compile_plan, solver_launch};
pub use definition_service::{SweepOverrides, apply_overrides, load_definition};
pub use error::{AppError, AppResult};
pub use sweep_service::{SweepResponse, TOOL_VERSION, execute_sweep, execute_with_session};

pub use sf_sweep::{SweepProgressEvent, SweepStage};
