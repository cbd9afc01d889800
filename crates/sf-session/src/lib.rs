//! sf-session: the boundary between sweepflow and an external CFD solver.
//!
//! Provides:
//! - `SolverSession` trait: configure, initialize, iterate, query field data
//! - Setting and field value types exchanged with the solver
//! - Typed session failures (configuration, divergence, timeout, ...)
//! - `ProcessSession`: a backend that drives a solver bridge process over a
//!   line-oriented stdin/stdout protocol
//!
//! # Architecture
//!
//! The orchestration crates only ever see the `SolverSession` trait. The
//! process backend is one implementation; tests substitute scripted sessions.

pub mod error;
pub mod process;
pub mod protocol;
pub mod session;
pub mod value;

pub use error::{SessionError, SessionResult};
pub use process::{ProcessSession, SolverLaunch};
pub use session::SolverSession;
pub use value::{FieldKind, FieldValue, ModelOptions, SettingValue};
