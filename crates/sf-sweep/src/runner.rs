//! The sweep loop: configure, solve and sample every grid point in order.

use std::time::Instant;

use sf_core::ParameterPoint;
use sf_results::{QuantitySample, ResultAggregator, ResultRecord, ResultTable, RunOutcome};
use sf_session::{SessionError, SettingValue, SolverSession};
use tracing::{debug, info, warn};

use crate::error::{SweepError, SweepResult};
use crate::grid::ParameterGrid;
use crate::plan::{BoundaryTarget, SweepPlan};
use crate::progress::{SweepProgressEvent, SweepStage};

/// Counters for a finished sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepStats {
    pub completed: usize,
    pub failed: usize,
    pub elapsed_s: f64,
}

/// A finished sweep: the table plus how it went.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub table: ResultTable,
    pub stats: SweepStats,
}

/// Drives one solver session through every point of a grid.
///
/// Failure policy:
/// - a rejected model or boundary setting aborts the sweep;
/// - divergence or timeout while solving marks the point failed and moves on;
/// - a failed field query marks only that quantity missing;
/// - any other session failure aborts the sweep.
#[derive(Debug, Clone)]
pub struct SweepRunner {
    plan: SweepPlan,
}

struct Tracker<'a> {
    started: Instant,
    total_points: usize,
    completed: usize,
    failed: usize,
    callback: Option<&'a mut dyn FnMut(SweepProgressEvent)>,
}

impl Tracker<'_> {
    fn emit(&mut self, stage: SweepStage, point_index: Option<usize>, message: Option<String>) {
        if let Some(cb) = self.callback.as_deref_mut() {
            cb(SweepProgressEvent {
                stage,
                point_index,
                total_points: self.total_points,
                completed: self.completed,
                failed: self.failed,
                elapsed_wall_s: self.started.elapsed().as_secs_f64(),
                message,
            });
        }
    }
}

impl SweepRunner {
    pub fn new(plan: SweepPlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &SweepPlan {
        &self.plan
    }

    /// Run the whole sweep.
    pub fn run<S: SolverSession + ?Sized>(
        &self,
        session: &mut S,
        grid: &ParameterGrid,
    ) -> SweepResult<SweepOutcome> {
        self.run_with_progress(session, grid, None)
    }

    /// Run the whole sweep and stream progress events.
    pub fn run_with_progress<S: SolverSession + ?Sized>(
        &self,
        session: &mut S,
        grid: &ParameterGrid,
        progress: Option<&mut dyn FnMut(SweepProgressEvent)>,
    ) -> SweepResult<SweepOutcome> {
        self.plan.check_against(grid)?;

        let mut tracker = Tracker {
            started: Instant::now(),
            total_points: grid.len(),
            completed: 0,
            failed: 0,
            callback: progress,
        };

        info!(grid = %grid, iterations = self.plan.iterations, "Starting sweep");

        tracker.emit(SweepStage::ApplyingModels, None, None);
        for model in &self.plan.models {
            debug!(model = %model.name, "Applying model setting");
            session
                .set_model(&model.name, &model.options)
                .map_err(|source| SweepError::ModelConfiguration {
                    name: model.name.clone(),
                    source,
                })?;
        }

        let mut aggregator = ResultAggregator::with_capacity(grid.len());
        for point in grid.points() {
            let index = Some(point.index());

            tracker.emit(SweepStage::Configuring, index, Some(point.to_string()));
            self.configure(session, &point)?;

            tracker.emit(SweepStage::Iterating, index, None);
            let record = match self.solve(session) {
                Ok(()) => {
                    tracker.emit(SweepStage::Sampling, index, None);
                    let quantities = self.sample(session, &point);
                    tracker.completed += 1;
                    info!(point = %point, "Point completed");
                    tracker.emit(SweepStage::PointCompleted, index, None);
                    ResultRecord::new(point, RunOutcome::Completed, quantities)
                }
                Err(e) if e.is_run_failure() => {
                    tracker.failed += 1;
                    warn!(point = %point, error = %e, "Run failed; recording missing values");
                    tracker.emit(SweepStage::PointFailed, index, Some(e.to_string()));
                    let quantities = self.missing_quantities();
                    ResultRecord::new(
                        point,
                        RunOutcome::Failed {
                            reason: e.to_string(),
                        },
                        quantities,
                    )
                }
                Err(source) => {
                    return Err(SweepError::Session {
                        stage: "solve",
                        point: point.to_string(),
                        source,
                    });
                }
            };

            aggregator.append(record)?;
        }

        let stats = SweepStats {
            completed: tracker.completed,
            failed: tracker.failed,
            elapsed_s: tracker.started.elapsed().as_secs_f64(),
        };
        tracker.emit(SweepStage::Completed, None, None);
        info!(
            completed = stats.completed,
            failed = stats.failed,
            elapsed_s = stats.elapsed_s,
            "Sweep finished"
        );

        Ok(SweepOutcome {
            table: aggregator.export(),
            stats,
        })
    }

    /// Fully specify every boundary parameter the plan owns for this point.
    fn configure<S: SolverSession + ?Sized>(
        &self,
        session: &mut S,
        point: &ParameterPoint,
    ) -> SweepResult<()> {
        for fixed in &self.plan.fixed_boundaries {
            set_boundary(session, point, &fixed.target, &fixed.value)?;
        }
        for coordinate in point.coordinates() {
            // check_against guarantees one binding per dimension
            let Some(binding) = self.plan.binding(&coordinate.name) else {
                continue;
            };
            set_boundary(
                session,
                point,
                &binding.target,
                &SettingValue::Number(coordinate.value),
            )?;
        }
        Ok(())
    }

    fn solve<S: SolverSession + ?Sized>(&self, session: &mut S) -> Result<(), SessionError> {
        session.initialize()?;
        session.run_iterations(self.plan.iterations)
    }

    fn sample<S: SolverSession + ?Sized>(
        &self,
        session: &mut S,
        point: &ParameterPoint,
    ) -> Vec<QuantitySample> {
        self.plan
            .quantities
            .iter()
            .map(|q| match session.get_field_quantity(&q.surface, &q.field) {
                Ok(value) if value.kind() == q.kind => QuantitySample::present(&q.name, value),
                Ok(value) => {
                    warn!(
                        point = %point,
                        quantity = %q.name,
                        expected = %q.kind,
                        found = %value.kind(),
                        "Field has unexpected shape; recording missing value"
                    );
                    QuantitySample::missing(&q.name, q.kind)
                }
                Err(e) => {
                    warn!(point = %point, quantity = %q.name, error = %e, "Field query failed");
                    QuantitySample::missing(&q.name, q.kind)
                }
            })
            .collect()
    }

    fn missing_quantities(&self) -> Vec<QuantitySample> {
        self.plan
            .quantities
            .iter()
            .map(|q| QuantitySample::missing(&q.name, q.kind))
            .collect()
    }
}

fn set_boundary<S: SolverSession + ?Sized>(
    session: &mut S,
    point: &ParameterPoint,
    target: &BoundaryTarget,
    value: &SettingValue,
) -> SweepResult<()> {
    debug!(surface = %target.surface, key = %target.key, %value, "Setting boundary parameter");
    session
        .set_boundary_parameter(&target.surface, &target.key, value)
        .map_err(|source| match source {
            SessionError::Configuration { .. } => SweepError::Configuration {
                point: point.to_string(),
                surface: target.surface.clone(),
                key: target.key.clone(),
                source,
            },
            source => SweepError::Session {
                stage: "configure",
                point: point.to_string(),
                source,
            },
        })
}
