//! End-to-end sweep behaviour against a scripted in-memory solver.

use std::path::Path;

use sf_results::{RunOutcome, to_csv_bytes};
use sf_session::{
    FieldKind, FieldValue, ModelOptions, SessionError, SessionResult, SettingValue, SolverSession,
};
use sf_sweep::{
    BoundaryTarget, Dimension, DimensionBinding, FixedBoundary, ModelSetting, ParameterGrid,
    QuantitySpec, SweepError, SweepPlan, SweepRunner, SweepStage,
};

/// Records every call and fails on demand.
#[derive(Default)]
struct ScriptedSolver {
    calls: Vec<String>,
    hot: f64,
    cold: f64,
    points_configured: usize,
    diverge_at: Option<(f64, f64)>,
    reject_on_point: Option<usize>,
    reject_model: bool,
    broken_field: Option<&'static str>,
    scalar_field: Option<&'static str>,
    stall_at: Option<(f64, f64)>,
    garbled_at: Option<(f64, f64)>,
    drop_on_point: Option<usize>,
}

impl SolverSession for ScriptedSolver {
    fn read_case(&mut self, path: &Path) -> SessionResult<()> {
        self.calls.push(format!("read-case {}", path.display()));
        Ok(())
    }

    fn set_model(&mut self, name: &str, _options: &ModelOptions) -> SessionResult<()> {
        self.calls.push(format!("set-model {}", name));
        if self.reject_model {
            return Err(SessionError::Configuration {
                message: format!("unknown model {}", name),
            });
        }
        Ok(())
    }

    fn set_boundary_parameter(
        &mut self,
        surface: &str,
        key: &str,
        value: &SettingValue,
    ) -> SessionResult<()> {
        self.calls
            .push(format!("set-boundary {} {} {}", surface, key, value));
        if key == "ke-spec" {
            self.points_configured += 1;
            if self.reject_on_point == Some(self.points_configured) {
                return Err(SessionError::Configuration {
                    message: "ke-spec not available".into(),
                });
            }
            if self.drop_on_point == Some(self.points_configured) {
                return Err(SessionError::Closed);
            }
        }
        if let SettingValue::Number(v) = value {
            match surface {
                "hot-inlet" => self.hot = *v,
                "cold-inlet" => self.cold = *v,
                _ => {}
            }
        }
        Ok(())
    }

    fn initialize(&mut self) -> SessionResult<()> {
        self.calls.push("initialize".into());
        Ok(())
    }

    fn run_iterations(&mut self, iterations: u32) -> SessionResult<()> {
        self.calls.push(format!("iterate {}", iterations));
        let at = Some((self.hot, self.cold));
        if self.diverge_at == at {
            return Err(SessionError::Divergence {
                message: "continuity residual exploded".into(),
            });
        }
        if self.stall_at == at {
            return Err(SessionError::Timeout {
                message: "no reply within 3600.0s".into(),
            });
        }
        if self.garbled_at == at {
            return Err(SessionError::Protocol {
                message: "malformed reply: 'Segmentation fault'".into(),
            });
        }
        Ok(())
    }

    fn get_field_quantity(&mut self, surface: &str, field: &str) -> SessionResult<FieldValue> {
        self.calls.push(format!("field {} {}", surface, field));
        if self.broken_field == Some(surface) {
            return Err(SessionError::Query {
                message: format!("no surface {}", surface),
            });
        }
        if self.scalar_field == Some(surface) {
            return Ok(FieldValue::Scalar(self.hot));
        }
        Ok(FieldValue::Vector([self.hot + self.cold, 0.0, 0.0]))
    }
}

fn grid() -> ParameterGrid {
    ParameterGrid::new(vec![
        Dimension::new("hot", vec![0.1, 0.2]),
        Dimension::new("cold", vec![0.1, 0.2]),
    ])
    .expect("valid grid")
}

fn target(surface: &str, key: &str) -> BoundaryTarget {
    BoundaryTarget {
        surface: surface.into(),
        key: key.into(),
    }
}

fn plan() -> SweepPlan {
    let mut viscous = ModelOptions::new();
    viscous.insert("model".into(), "k-epsilon".into());
    SweepPlan {
        models: vec![ModelSetting {
            name: "viscous".into(),
            options: viscous,
        }],
        fixed_boundaries: vec![FixedBoundary {
            target: target("cold-inlet", "ke-spec"),
            value: SettingValue::Flag(false),
        }],
        bindings: vec![
            DimensionBinding {
                dimension: "hot".into(),
                target: target("hot-inlet", "velocity"),
            },
            DimensionBinding {
                dimension: "cold".into(),
                target: target("cold-inlet", "velocity"),
            },
        ],
        iterations: 100,
        quantities: ["hot-inlet", "cold-inlet", "outlet"]
            .into_iter()
            .map(|surface| QuantitySpec {
                name: format!("{}_velocity", surface),
                surface: surface.into(),
                field: "velocity".into(),
                kind: FieldKind::Vector,
            })
            .collect(),
    }
}

#[test]
fn all_points_succeed_in_row_major_order() {
    let mut solver = ScriptedSolver::default();
    let outcome = SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .expect("sweep failed");

    assert_eq!(outcome.table.len(), 4);
    assert_eq!(outcome.stats.completed, 4);
    assert_eq!(outcome.stats.failed, 0);

    let order: Vec<(f64, f64)> = outcome
        .table
        .rows()
        .iter()
        .map(|r| {
            (
                r.point().value("hot").unwrap(),
                r.point().value("cold").unwrap(),
            )
        })
        .collect();
    assert_eq!(order, [(0.1, 0.1), (0.1, 0.2), (0.2, 0.1), (0.2, 0.2)]);

    let csv = String::from_utf8(to_csv_bytes(&outcome.table).unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 5);
}

#[test]
fn model_set_once_and_boundaries_every_point() {
    let mut solver = ScriptedSolver::default();
    SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .expect("sweep failed");

    let count = |prefix: &str| solver.calls.iter().filter(|c| c.starts_with(prefix)).count();
    assert_eq!(count("set-model"), 1);
    assert_eq!(count("set-boundary cold-inlet ke-spec"), 4);
    assert_eq!(count("set-boundary hot-inlet velocity"), 4);
    assert_eq!(count("iterate 100"), 4);
    assert_eq!(count("field"), 12);

    // The model comes first, and each point is configured before it is solved.
    assert_eq!(solver.calls[0], "set-model viscous");
    assert_eq!(
        &solver.calls[1..6],
        [
            "set-boundary cold-inlet ke-spec no",
            "set-boundary hot-inlet velocity 0.1",
            "set-boundary cold-inlet velocity 0.1",
            "initialize",
            "iterate 100",
        ]
    );
}

#[test]
fn divergence_is_recorded_and_sweep_continues() {
    let mut solver = ScriptedSolver {
        diverge_at: Some((0.2, 0.2)),
        ..Default::default()
    };
    let outcome = SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .expect("divergence must not abort the sweep");

    assert_eq!(outcome.table.len(), 4);
    assert_eq!(outcome.stats.failed, 1);

    let rows = outcome.table.rows();
    for row in &rows[..3] {
        assert_eq!(row.outcome(), &RunOutcome::Completed);
        assert!(row.quantities().iter().all(|q| q.value.is_some()));
    }
    assert!(rows[3].outcome().is_failed());
    assert!(rows[3].quantities().iter().all(|q| q.value.is_none()));

    let csv = String::from_utf8(to_csv_bytes(&outcome.table).unwrap()).unwrap();
    let last = csv.lines().last().unwrap();
    assert_eq!(last, format!("0.2,0.2{}", ",NA".repeat(12)));
}

#[test]
fn failed_query_only_blanks_that_quantity() {
    let mut solver = ScriptedSolver {
        broken_field: Some("outlet"),
        ..Default::default()
    };
    let outcome = SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .expect("sweep failed");

    for row in outcome.table.rows() {
        assert_eq!(row.outcome(), &RunOutcome::Completed);
        assert!(row.quantity("hot-inlet_velocity").unwrap().value.is_some());
        assert!(row.quantity("cold-inlet_velocity").unwrap().value.is_some());
        assert!(row.quantity("outlet_velocity").unwrap().value.is_none());
    }
}

#[test]
fn configuration_error_aborts_sweep() {
    let mut solver = ScriptedSolver {
        reject_on_point: Some(2),
        ..Default::default()
    };
    let err = SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .unwrap_err();

    assert!(err.is_configuration());
    let msg = err.to_string();
    assert!(msg.contains("cold-inlet/ke-spec"), "message was: {msg}");
    assert!(msg.contains("#2"), "message was: {msg}");

    // Point 2 was never solved.
    let iterations = solver.calls.iter().filter(|c| c.starts_with("iterate")).count();
    assert_eq!(iterations, 1);
}

#[test]
fn rejected_model_aborts_before_any_point() {
    let mut solver = ScriptedSolver {
        reject_model: true,
        ..Default::default()
    };
    let err = SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .unwrap_err();
    assert!(matches!(err, SweepError::ModelConfiguration { .. }));
    assert!(!solver.calls.iter().any(|c| c.starts_with("set-boundary")));
}

#[test]
fn progress_reports_every_point() {
    let mut solver = ScriptedSolver {
        diverge_at: Some((0.1, 0.2)),
        ..Default::default()
    };
    let mut stages = Vec::new();
    let mut last_fraction = 0.0;
    SweepRunner::new(plan())
        .run_with_progress(
            &mut solver,
            &grid(),
            Some(&mut |event| {
                stages.push(event.stage);
                last_fraction = event.fraction_complete();
            }),
        )
        .expect("sweep failed");

    let finished = stages
        .iter()
        .filter(|s| matches!(s, SweepStage::PointCompleted | SweepStage::PointFailed))
        .count();
    assert_eq!(finished, 4);
    assert_eq!(stages.last(), Some(&SweepStage::Completed));
    assert_eq!(last_fraction, 1.0);
}

#[test]
fn wrong_field_kind_is_recorded_missing() {
    let mut solver = ScriptedSolver {
        scalar_field: Some("cold-inlet"),
        ..Default::default()
    };
    let outcome = SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .expect("sweep failed");

    assert_eq!(outcome.stats.completed, 4);
    for row in outcome.table.rows() {
        let sample = row.quantity("cold-inlet_velocity").unwrap();
        assert_eq!(sample.kind, FieldKind::Vector);
        assert!(sample.value.is_none());
        assert!(row.quantity("outlet_velocity").unwrap().value.is_some());
    }
}

#[test]
fn timeout_is_recorded_and_sweep_continues() {
    let mut solver = ScriptedSolver {
        stall_at: Some((0.1, 0.2)),
        ..Default::default()
    };
    let outcome = SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .expect("timeout must not abort the sweep");

    assert_eq!(outcome.table.len(), 4);
    assert_eq!(outcome.stats.failed, 1);
    let failed = &outcome.table.rows()[1];
    match failed.outcome() {
        RunOutcome::Failed { reason } => assert!(reason.contains("timed out"), "{reason}"),
        other => panic!("expected failed row, got {other:?}"),
    }
    assert!(outcome.table.rows()[2].outcome() == &RunOutcome::Completed);
}

#[test]
fn protocol_failure_while_iterating_aborts() {
    let mut solver = ScriptedSolver {
        garbled_at: Some((0.1, 0.2)),
        ..Default::default()
    };
    let err = SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .unwrap_err();

    assert!(matches!(
        err,
        SweepError::Session {
            stage: "solve",
            source: SessionError::Protocol { .. },
            ..
        }
    ));
    assert!(!err.is_configuration());
    let iterations = solver.calls.iter().filter(|c| c.starts_with("iterate")).count();
    assert_eq!(iterations, 2);
}

#[test]
fn lost_session_while_configuring_is_not_a_rejection() {
    let mut solver = ScriptedSolver {
        drop_on_point: Some(3),
        ..Default::default()
    };
    let err = SweepRunner::new(plan())
        .run(&mut solver, &grid())
        .unwrap_err();

    assert!(!err.is_configuration());
    assert!(matches!(
        err,
        SweepError::Session {
            stage: "configure",
            source: SessionError::Closed,
            ..
        }
    ));
    assert!(!err.to_string().contains("rejected"));
}
