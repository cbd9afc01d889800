//! What a sweep sets on the solver and what it samples.

use crate::error::{SweepError, SweepResult};
use crate::grid::ParameterGrid;
use sf_session::{FieldKind, ModelOptions, SettingValue};
use std::collections::HashSet;

/// A global model setting applied once before the first point.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSetting {
    pub name: String,
    pub options: ModelOptions,
}

/// Where a dimension value lands on the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryTarget {
    pub surface: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionBinding {
    pub dimension: String,
    pub target: BoundaryTarget,
}

/// A boundary parameter re-asserted with the same value at every point.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedBoundary {
    pub target: BoundaryTarget,
    pub value: SettingValue,
}

/// A field quantity sampled after each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantitySpec {
    pub name: String,
    pub surface: String,
    pub field: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub models: Vec<ModelSetting>,
    pub fixed_boundaries: Vec<FixedBoundary>,
    pub bindings: Vec<DimensionBinding>,
    /// Iteration budget per point, the same for the whole sweep.
    pub iterations: u32,
    pub quantities: Vec<QuantitySpec>,
}

impl SweepPlan {
    pub fn binding(&self, dimension: &str) -> Option<&DimensionBinding> {
        self.bindings.iter().find(|b| b.dimension == dimension)
    }

    /// Check the plan is usable with `grid`: every dimension bound exactly
    /// once, no binding for an unknown dimension, unique quantity names, and
    /// a non-zero iteration budget.
    pub fn check_against(&self, grid: &ParameterGrid) -> SweepResult<()> {
        if self.iterations == 0 {
            return Err(plan_error("iteration count must be positive"));
        }
        if self.quantities.is_empty() {
            return Err(plan_error("no result quantities requested"));
        }

        let mut names = HashSet::new();
        for q in &self.quantities {
            if !names.insert(q.name.as_str()) {
                return Err(plan_error(&format!("quantity '{}' requested twice", q.name)));
            }
        }

        for dim in grid.dimensions() {
            let count = self
                .bindings
                .iter()
                .filter(|b| b.dimension == dim.name)
                .count();
            if count != 1 {
                return Err(plan_error(&format!(
                    "dimension '{}' must be bound to exactly one boundary parameter (found {})",
                    dim.name, count
                )));
            }
        }
        for binding in &self.bindings {
            if !grid.dimensions().iter().any(|d| d.name == binding.dimension) {
                return Err(plan_error(&format!(
                    "binding refers to unknown dimension '{}'",
                    binding.dimension
                )));
            }
        }

        Ok(())
    }
}

fn plan_error(what: &str) -> SweepError {
    SweepError::Plan {
        what: what.to_string(),
    }
}
