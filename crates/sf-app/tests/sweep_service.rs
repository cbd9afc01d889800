//! Service-level sweep tests: session scoping, export and manifest.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use sf_app::{AppError, execute_with_session};
use sf_project::SweepDefinition;
use sf_results::{load_manifest, manifest_path_for};
use sf_session::{
    FieldValue, ModelOptions, SessionError, SessionResult, SettingValue, SolverSession,
};

#[derive(Default)]
struct Log {
    calls: Vec<String>,
    closed: bool,
}

/// In-memory solver that shares its call log with the test.
struct FakeSolver {
    log: Rc<RefCell<Log>>,
    hot: f64,
    diverge_above: Option<f64>,
    reject_key: Option<&'static str>,
}

impl FakeSolver {
    fn new(log: &Rc<RefCell<Log>>) -> Self {
        Self {
            log: Rc::clone(log),
            hot: 0.0,
            diverge_above: None,
            reject_key: None,
        }
    }

    fn record(&self, call: String) {
        self.log.borrow_mut().calls.push(call);
    }
}

impl SolverSession for FakeSolver {
    fn read_case(&mut self, path: &Path) -> SessionResult<()> {
        self.record(format!("read-case {}", path.display()));
        Ok(())
    }

    fn set_model(&mut self, name: &str, _options: &ModelOptions) -> SessionResult<()> {
        self.record(format!("set-model {}", name));
        Ok(())
    }

    fn set_boundary_parameter(
        &mut self,
        surface: &str,
        key: &str,
        value: &SettingValue,
    ) -> SessionResult<()> {
        self.record(format!("set-boundary {} {} {}", surface, key, value));
        if self.reject_key == Some(key) {
            return Err(SessionError::Configuration {
                message: format!("{} is not a parameter of {}", key, surface),
            });
        }
        if let (SettingValue::Number(v), "hot-inlet") = (value, surface) {
            self.hot = *v;
        }
        Ok(())
    }

    fn initialize(&mut self) -> SessionResult<()> {
        self.record("initialize".into());
        Ok(())
    }

    fn run_iterations(&mut self, iterations: u32) -> SessionResult<()> {
        self.record(format!("iterate {}", iterations));
        match self.diverge_above {
            Some(limit) if self.hot > limit => Err(SessionError::Divergence {
                message: "residuals diverged".into(),
            }),
            _ => Ok(()),
        }
    }

    fn get_field_quantity(&mut self, surface: &str, field: &str) -> SessionResult<FieldValue> {
        self.record(format!("field {} {}", surface, field));
        Ok(FieldValue::Vector([self.hot, 0.0, 0.0]))
    }

    fn close(&mut self) -> SessionResult<()> {
        self.log.borrow_mut().closed = true;
        Ok(())
    }
}

fn definition(output: PathBuf) -> SweepDefinition {
    let yaml = r#"
version: 1
name: elbow
case_file: elbow.cas.h5
solver: { command: fluent-bridge }
models:
  - { name: viscous, options: { model: k-epsilon } }
fixed_boundaries:
  - { surface: cold-inlet, key: ke-spec, value: false }
dimensions:
  - { name: hot, surface: hot-inlet, key: velocity, values: [0.1, 0.2] }
  - { name: cold, surface: cold-inlet, key: velocity, values: [0.1, 0.2] }
iterations: 50
quantities:
  - { name: outlet_velocity, surface: outlet, field: velocity }
output: data.csv
"#;
    let mut def = sf_project::parse_yaml(yaml).expect("valid definition");
    def.output = output;
    def
}

#[test]
fn successful_sweep_writes_csv_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("data.csv");
    let log = Rc::new(RefCell::new(Log::default()));

    let response = execute_with_session(&definition(output.clone()), FakeSolver::new(&log), None)
        .expect("sweep failed");

    assert_eq!(response.stats.completed, 4);
    assert_eq!(response.output, output);
    assert!(log.borrow().closed);
    assert_eq!(log.borrow().calls[0], "read-case elbow.cas.h5");

    let csv = std::fs::read_to_string(&output).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("hot,cold,outlet_velocity_x,outlet_velocity_y,outlet_velocity_z,outlet_velocity_mag")
    );
    assert_eq!(lines.count(), 4);

    let manifest = load_manifest(&manifest_path_for(&output)).unwrap();
    assert_eq!(manifest.sweep_id, response.sweep_id);
    assert_eq!(manifest.point_count, 4);
    assert_eq!(manifest.failed_count, 0);
    assert_eq!(manifest.iterations, 50);
}

#[test]
fn divergent_points_are_exported_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("data.csv");
    let log = Rc::new(RefCell::new(Log::default()));
    let mut solver = FakeSolver::new(&log);
    solver.diverge_above = Some(0.15);

    let response =
        execute_with_session(&definition(output.clone()), solver, None).expect("sweep failed");

    assert_eq!(response.stats.completed, 2);
    assert_eq!(response.stats.failed, 2);
    assert!(log.borrow().closed);

    let csv = std::fs::read_to_string(&output).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2], "0.2,0.1,NA,NA,NA,NA");
    assert_eq!(rows[3], "0.2,0.2,NA,NA,NA,NA");

    let manifest = load_manifest(&manifest_path_for(&output)).unwrap();
    assert_eq!(manifest.failed_count, 2);
    assert_eq!(manifest.failed_points.len(), 2);
    assert_eq!(manifest.failed_points[0].index, 2);
}

#[test]
fn configuration_error_writes_nothing_and_closes_session() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("data.csv");
    let log = Rc::new(RefCell::new(Log::default()));
    let mut solver = FakeSolver::new(&log);
    solver.reject_key = Some("ke-spec");

    let err = execute_with_session(&definition(output.clone()), solver, None).unwrap_err();

    assert!(matches!(err, AppError::Configuration(_)), "got {err:?}");
    assert!(log.borrow().closed);
    assert!(!output.exists());
    assert!(!manifest_path_for(&output).exists());
    assert!(!log.borrow().calls.iter().any(|c| c.starts_with("iterate")));
}

#[test]
fn invalid_grid_never_touches_the_solver() {
    let dir = tempfile::tempdir().unwrap();
    let mut def = definition(dir.path().join("data.csv"));
    def.dimensions[0].values = sf_project::ValuesDef::List(vec![0.1, 0.1]);
    let log = Rc::new(RefCell::new(Log::default()));

    let err = execute_with_session(&def, FakeSolver::new(&log), None).unwrap_err();

    assert!(matches!(err, AppError::Definition(_) | AppError::InvalidGrid(_)));
    assert!(log.borrow().calls.is_empty());
    assert!(log.borrow().closed);
}

#[test]
fn unwritable_output_returns_table() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("missing-dir").join("data.csv");
    let log = Rc::new(RefCell::new(Log::default()));

    let err = execute_with_session(&definition(output), FakeSolver::new(&log), None).unwrap_err();

    match err {
        AppError::Export { table, .. } => assert_eq!(table.len(), 4),
        other => panic!("expected export error, got {other:?}"),
    }
}

#[test]
fn manifest_failure_returns_table() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("data.csv");
    // A directory where the manifest should go makes the final rename fail.
    std::fs::create_dir(manifest_path_for(&output)).unwrap();
    let log = Rc::new(RefCell::new(Log::default()));

    let err = execute_with_session(&definition(output.clone()), FakeSolver::new(&log), None)
        .unwrap_err();

    match err {
        AppError::Export { path, table, .. } => {
            assert_eq!(path, manifest_path_for(&output));
            assert_eq!(table.len(), 4);
        }
        other => panic!("expected export error, got {other:?}"),
    }
    assert!(output.exists());
    assert!(log.borrow().closed);
}
