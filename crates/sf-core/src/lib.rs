//! sf-core: shared foundation for sweepflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - point (parameter points visited by a sweep)
//! - error (shared error type)

pub mod error;
pub mod numeric;
pub mod point;

pub use error::{SfError, SfResult};
pub use numeric::*;
pub use point::{Coordinate, ParameterPoint};
