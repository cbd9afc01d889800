//! Compile a sweep definition into runtime grid, plan and launch settings.

use std::time::Duration;

use sf_project::{SpacingDef, SweepDefinition, ValuesDef};
use sf_session::SolverLaunch;
use sf_sweep::{
    BoundaryTarget, Dimension, DimensionBinding, FixedBoundary, ModelSetting, ParameterGrid,
    QuantitySpec, RangeSpec, Spacing, SweepPlan, SweepRunner,
};

use crate::error::{AppError, AppResult};

/// Everything needed to execute a definition.
#[derive(Debug, Clone)]
pub struct CompiledSweep {
    pub grid: ParameterGrid,
    pub runner: SweepRunner,
    pub launch: SolverLaunch,
}

pub fn compile_definition(def: &SweepDefinition) -> AppResult<CompiledSweep> {
    sf_project::validate_definition(def).map_err(|e| AppError::Definition(e.to_string()))?;
    let grid = compile_grid(def)?;
    let plan = compile_plan(def);
    plan.check_against(&grid)?;
    Ok(CompiledSweep {
        grid,
        runner: SweepRunner::new(plan),
        launch: solver_launch(def)?,
    })
}

/// Expand the dimension definitions into a parameter grid.
pub fn compile_grid(def: &SweepDefinition) -> AppResult<ParameterGrid> {
    let dimensions = def
        .dimensions
        .iter()
        .map(|d| match &d.values {
            ValuesDef::List(values) => Dimension::new(&d.name, values.clone()),
            ValuesDef::Range {
                start,
                end,
                points,
                spacing,
            } => Dimension::from_range(
                &d.name,
                &RangeSpec {
                    start: *start,
                    end: *end,
                    points: *points,
                    spacing: match spacing {
                        SpacingDef::Linear => Spacing::Linear,
                        SpacingDef::Logarithmic => Spacing::Logarithmic,
                    },
                },
            ),
        })
        .collect();
    Ok(ParameterGrid::new(dimensions)?)
}

pub fn compile_plan(def: &SweepDefinition) -> SweepPlan {
    SweepPlan {
        models: def
            .models
            .iter()
            .map(|m| ModelSetting {
                name: m.name.clone(),
                options: m.options.clone(),
            })
            .collect(),
        fixed_boundaries: def
            .fixed_boundaries
            .iter()
            .map(|f| FixedBoundary {
                target: BoundaryTarget {
                    surface: f.surface.clone(),
                    key: f.key.clone(),
                },
                value: f.value.clone(),
            })
            .collect(),
        bindings: def
            .dimensions
            .iter()
            .map(|d| DimensionBinding {
                dimension: d.name.clone(),
                target: BoundaryTarget {
                    surface: d.surface.clone(),
                    key: d.key.clone(),
                },
            })
            .collect(),
        iterations: def.iterations,
        quantities: def
            .quantities
            .iter()
            .map(|q| QuantitySpec {
                name: q.name.clone(),
                surface: q.surface.clone(),
                field: q.field.clone(),
                kind: q.kind,
            })
            .collect(),
    }
}

pub fn solver_launch(def: &SweepDefinition) -> AppResult<SolverLaunch> {
    Ok(SolverLaunch {
        command: def.solver.command.clone(),
        args: def.solver.args.clone(),
        working_dir: def.solver.working_dir.clone(),
        command_timeout: timeout("solver.command_timeout_s", def.solver.command_timeout_s)?,
        iterate_timeout: def
            .solver
            .iterate_timeout_s
            .map(|s| timeout("solver.iterate_timeout_s", s))
            .transpose()?,
    })
}

fn timeout(field: &str, seconds: f64) -> AppResult<Duration> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| AppError::Definition(format!("{} = {}: {}", field, seconds, e)))
}
