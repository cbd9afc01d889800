//! Parameter sweep orchestration for sweepflow.
//!
//! Provides:
//! - `ParameterGrid`: deterministic Cartesian product of named dimensions
//! - `SweepPlan`: what to set on the solver and what to sample per point
//! - `SweepRunner`: the sequential configure / solve / sample loop
//! - Progress events for frontends

pub mod error;
pub mod grid;
pub mod plan;
pub mod progress;
pub mod runner;

pub use error::{GridError, SweepError, SweepResult};
pub use grid::{Dimension, GridPoints, ParameterGrid, RangeSpec, Spacing};
pub use plan::{
    BoundaryTarget, DimensionBinding, FixedBoundary, ModelSetting, QuantitySpec, SweepPlan,
};
pub use progress::{SweepProgressEvent, SweepStage};
pub use runner::{SweepOutcome, SweepRunner, SweepStats};
