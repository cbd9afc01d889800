//! Sweep definition loading and command-line overrides.

use std::path::{Path, PathBuf};

use sf_project::{SweepDefinition, ValuesDef};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Values given on the command line that replace parts of a definition.
#[derive(Debug, Clone, Default)]
pub struct SweepOverrides {
    pub case_file: Option<PathBuf>,
    pub iterations: Option<u32>,
    pub output: Option<PathBuf>,
    /// Replacement candidate values for existing dimensions, by name.
    pub dimensions: Vec<(String, Vec<f64>)>,
}

/// Load and validate a definition. Relative `case_file`, `output` and
/// `solver.working_dir` are resolved against the definition's directory.
pub fn load_definition(path: &Path) -> AppResult<SweepDefinition> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::DefinitionFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut def = sf_project::parse_yaml(&content)?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    def.case_file = resolve(base, &def.case_file);
    def.output = resolve(base, &def.output);
    if let Some(dir) = &def.solver.working_dir {
        def.solver.working_dir = Some(resolve(base, dir));
    }
    debug!(path = %path.display(), name = %def.name, "Loaded sweep definition");

    Ok(def)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Apply overrides and re-validate.
pub fn apply_overrides(
    mut def: SweepDefinition,
    overrides: &SweepOverrides,
) -> AppResult<SweepDefinition> {
    if let Some(case_file) = &overrides.case_file {
        def.case_file = case_file.clone();
    }
    if let Some(iterations) = overrides.iterations {
        def.iterations = iterations;
    }
    if let Some(output) = &overrides.output {
        def.output = output.clone();
    }
    for (name, values) in &overrides.dimensions {
        let dim = def
            .dimensions
            .iter_mut()
            .find(|d| &d.name == name)
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "dimension '{}' is not declared in the definition",
                    name
                ))
            })?;
        dim.values = ValuesDef::List(values.clone());
    }

    sf_project::validate_definition(&def).map_err(|e| AppError::Definition(e.to_string()))?;
    Ok(def)
}
