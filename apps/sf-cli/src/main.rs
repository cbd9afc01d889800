use clap::{Parser, Subcommand};
use sf_app::{
    AppError, AppResult, SweepOverrides, SweepProgressEvent, SweepStage, apply_overrides,
    compile_definition, compile_grid, execute_sweep, load_definition,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "SweepFlow CLI - parametric CFD sweeps over a solver bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sweep and export the results table
    Run {
        /// Path to the sweep definition YAML file
        definition: PathBuf,
        /// Case file to load instead of the one in the definition
        #[arg(long)]
        case: Option<PathBuf>,
        /// Solver iterations per point
        #[arg(long)]
        iterations: Option<u32>,
        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Replace a dimension's values, e.g. --dim hot=0.1,0.5,1.0
        #[arg(long = "dim", value_name = "NAME=V1,V2,...", value_parser = parse_dimension)]
        dimensions: Vec<(String, Vec<f64>)>,
    },
    /// Validate sweep definition syntax and structure
    Validate {
        /// Path to the sweep definition YAML file
        definition: PathBuf,
    },
    /// Print the grid visitation order without starting a solver
    Grid {
        /// Path to the sweep definition YAML file
        definition: PathBuf,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            definition,
            case,
            iterations,
            output,
            dimensions,
        } => cmd_run(
            &definition,
            &SweepOverrides {
                case_file: case,
                iterations,
                output,
                dimensions,
            },
        ),
        Commands::Validate { definition } => cmd_validate(&definition),
        Commands::Grid { definition } => cmd_grid(&definition),
    }
}

fn parse_dimension(arg: &str) -> Result<(String, Vec<f64>), String> {
    let (name, values) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=V1,V2,..., got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("dimension name is empty".to_string());
    }
    let values = values
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("bad value '{}' for {}: {}", v, name, e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name.to_string(), values))
}

fn cmd_validate(definition_path: &Path) -> AppResult<()> {
    println!("Validating sweep definition: {}", definition_path.display());
    let def = load_definition(definition_path)?;
    let compiled = compile_definition(&def)?;
    println!("✓ Definition is valid");
    println!("  Grid: {}", compiled.grid);
    println!("  Quantities: {}", def.quantities.len());
    Ok(())
}

fn cmd_grid(definition_path: &Path) -> AppResult<()> {
    let def = load_definition(definition_path)?;
    let grid = compile_grid(&def)?;
    println!("{}", grid);
    for point in grid.points() {
        println!("  {}", point);
    }
    Ok(())
}

fn cmd_run(definition_path: &Path, overrides: &SweepOverrides) -> AppResult<()> {
    debug!(?overrides, "Applying command-line overrides");
    let def = apply_overrides(load_definition(definition_path)?, overrides)?;
    println!("Running sweep: {}", def.name);
    println!("  Case: {}", def.case_file.display());
    println!("  Iterations per point: {}", def.iterations);

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let result = execute_sweep(
        &def,
        Some(&mut |event| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    );
    clear_progress_line();

    let response = match result {
        Ok(response) => response,
        Err(AppError::Export {
            path,
            message,
            table,
        }) => {
            save_fallback(&path, &def.output, &table);
            return Err(AppError::Results(format!(
                "failed to export results to {}: {}",
                path.display(),
                message
            )));
        }
        Err(e) => return Err(e),
    };

    println!("✓ Sweep completed: {}", response.sweep_id);
    println!(
        "  Points: {} completed, {} failed",
        response.stats.completed, response.stats.failed
    );
    println!("  Elapsed: {:.1}s", response.stats.elapsed_s);
    println!("  Results: {}", response.output.display());
    println!("  Manifest: {}", response.manifest_path.display());
    Ok(())
}

/// Try to keep the results of a finished sweep when the configured output
/// cannot be written.
fn save_fallback(path: &Path, output: &Path, table: &sf_results::ResultTable) {
    let name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "results.csv".into());
    let fallback = std::env::temp_dir().join(name);
    match sf_results::write_csv(table, &fallback) {
        Ok(()) => eprintln!(
            "Could not write {}; results saved to {}",
            path.display(),
            fallback.display()
        ),
        Err(e) => eprintln!("Could not save results anywhere: {}", e),
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &SweepProgressEvent) {
    match event.stage {
        SweepStage::ApplyingModels => {
            print!("\rApplying model settings  elapsed={:.1}s", event.elapsed_wall_s);
        }
        _ => {
            let width = 28usize;
            let fraction = event.fraction_complete();
            let filled = ((fraction * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            let mut line = format!(
                "\r[{}] {:>6.2}%  phase={}  done={}/{}  failed={}  elapsed={:.1}s",
                bar,
                fraction * 100.0,
                event.stage.label(),
                event.completed + event.failed,
                event.total_points,
                event.failed,
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
        }
    }
    let _ = io::stdout().flush();
}
