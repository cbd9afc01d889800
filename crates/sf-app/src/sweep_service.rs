//! Sweep execution service: scoped session, run, export, manifest.

use std::path::PathBuf;

use chrono::Utc;
use sf_project::SweepDefinition;
use sf_results::{ResultTable, SweepManifest, manifest_path_for, write_csv, write_manifest};
use sf_session::{ProcessSession, SolverSession};
use sf_sweep::{SweepProgressEvent, SweepStats};
use tracing::{info, warn};

use crate::compile::{CompiledSweep, compile_definition};
use crate::error::{AppError, AppResult};

/// Version recorded in manifests and mixed into sweep IDs.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of a successful sweep.
#[derive(Debug, Clone)]
pub struct SweepResponse {
    pub sweep_id: String,
    pub output: PathBuf,
    pub manifest_path: PathBuf,
    pub stats: SweepStats,
    pub table: ResultTable,
}

/// Launch the configured solver bridge and run the sweep.
///
/// The grid and plan are checked before the solver is started.
pub fn execute_sweep(
    def: &SweepDefinition,
    progress: Option<&mut dyn FnMut(SweepProgressEvent)>,
) -> AppResult<SweepResponse> {
    let compiled = compile_definition(def)?;
    let session = ProcessSession::launch(&compiled.launch).map_err(|e| {
        AppError::Session(format!(
            "failed to launch solver '{}': {}",
            compiled.launch.command, e
        ))
    })?;
    run_compiled(def, &compiled, session, progress)
}

/// Run the sweep on an already open session. The session is closed before
/// returning, whatever the outcome.
pub fn execute_with_session<S: SolverSession>(
    def: &SweepDefinition,
    mut session: S,
    progress: Option<&mut dyn FnMut(SweepProgressEvent)>,
) -> AppResult<SweepResponse> {
    let compiled = match compile_definition(def) {
        Ok(compiled) => compiled,
        Err(e) => {
            close_session(&mut session);
            return Err(e);
        }
    };
    run_compiled(def, &compiled, session, progress)
}

fn run_compiled<S: SolverSession>(
    def: &SweepDefinition,
    compiled: &CompiledSweep,
    mut session: S,
    progress: Option<&mut dyn FnMut(SweepProgressEvent)>,
) -> AppResult<SweepResponse> {
    let sweep_id = sf_results::compute_sweep_id(def, TOOL_VERSION);
    let started_at = Utc::now().to_rfc3339();
    info!(sweep = %def.name, id = %sweep_id, case = %def.case_file.display(), "Running sweep");

    let result = session
        .read_case(&def.case_file)
        .map_err(|e| {
            AppError::Session(format!(
                "failed to read case {}: {}",
                def.case_file.display(),
                e
            ))
        })
        .and_then(|()| {
            compiled
                .runner
                .run_with_progress(&mut session, &compiled.grid, progress)
                .map_err(AppError::from)
        });
    close_session(&mut session);
    // A fatal error leaves no CSV and no manifest behind.
    let outcome = result?;

    let mut manifest = SweepManifest {
        sweep_id: sweep_id.clone(),
        name: def.name.clone(),
        tool_version: TOOL_VERSION.to_string(),
        started_at,
        finished_at: Utc::now().to_rfc3339(),
        case_file: def.case_file.clone(),
        iterations: def.iterations,
        point_count: 0,
        completed_count: 0,
        failed_count: 0,
        failed_points: Vec::new(),
        output: def.output.clone(),
    };
    manifest.record_table(&outcome.table);

    if let Err(e) = write_csv(&outcome.table, &def.output) {
        return Err(AppError::Export {
            path: def.output.clone(),
            message: e.to_string(),
            table: Box::new(outcome.table),
        });
    }

    let manifest_path = manifest_path_for(&def.output);
    if let Err(e) = write_manifest(&manifest_path, &manifest) {
        return Err(AppError::Export {
            path: manifest_path,
            message: e.to_string(),
            table: Box::new(outcome.table),
        });
    }

    Ok(SweepResponse {
        sweep_id,
        output: def.output.clone(),
        manifest_path,
        stats: outcome.stats,
        table: outcome.table,
    })
}

fn close_session<S: SolverSession>(session: &mut S) {
    if let Err(e) = session.close() {
        warn!(error = %e, "Failed to close solver session cleanly");
    }
}
