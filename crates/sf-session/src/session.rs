//! SolverSession trait for pluggable solver backends.

use crate::error::SessionResult;
use crate::value::{FieldValue, ModelOptions, SettingValue};
use std::path::Path;

/// One long-lived connection to an external CFD solver.
///
/// All calls block until the solver answers. A session is not safe to drive
/// from more than one place at a time, so every method takes `&mut self`.
pub trait SolverSession {
    /// Load the case (mesh + setup) the sweep operates on.
    fn read_case(&mut self, path: &Path) -> SessionResult<()>;

    /// Apply a global model setting (e.g. `viscous` with `model: k-epsilon`).
    fn set_model(&mut self, name: &str, options: &ModelOptions) -> SessionResult<()>;

    /// Overwrite one boundary parameter on a named surface.
    fn set_boundary_parameter(
        &mut self,
        surface: &str,
        key: &str,
        value: &SettingValue,
    ) -> SessionResult<()>;

    /// Initialize the solution field.
    fn initialize(&mut self) -> SessionResult<()>;

    /// Run a fixed number of solver iterations.
    fn run_iterations(&mut self, iterations: u32) -> SessionResult<()>;

    /// Sample a field on a named surface.
    fn get_field_quantity(&mut self, surface: &str, field: &str) -> SessionResult<FieldValue>;

    /// Release the solver. Further calls fail with `SessionError::Closed`.
    ///
    /// Default implementation does nothing.
    fn close(&mut self) -> SessionResult<()> {
        Ok(())
    }
}

impl<S: SolverSession + ?Sized> SolverSession for Box<S> {
    fn read_case(&mut self, path: &Path) -> SessionResult<()> {
        (**self).read_case(path)
    }

    fn set_model(&mut self, name: &str, options: &ModelOptions) -> SessionResult<()> {
        (**self).set_model(name, options)
    }

    fn set_boundary_parameter(
        &mut self,
        surface: &str,
        key: &str,
        value: &SettingValue,
    ) -> SessionResult<()> {
        (**self).set_boundary_parameter(surface, key, value)
    }

    fn initialize(&mut self) -> SessionResult<()> {
        (**self).initialize()
    }

    fn run_iterations(&mut self, iterations: u32) -> SessionResult<()> {
        (**self).run_iterations(iterations)
    }

    fn get_field_quantity(&mut self, surface: &str, field: &str) -> SessionResult<FieldValue> {
        (**self).get_field_quantity(surface, field)
    }

    fn close(&mut self) -> SessionResult<()> {
        (**self).close()
    }
}
