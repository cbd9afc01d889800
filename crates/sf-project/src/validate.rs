//! Sweep definition validation.

use crate::schema::{SweepDefinition, ValuesDef};
use sf_results::{QuantityColumn, TableSchema};
use sf_session::SettingValue;
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing: {what}")]
    Missing { what: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_definition(def: &SweepDefinition) -> Result<(), ValidationError> {
    if def.version == 0 || def.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: def.version,
        });
    }
    if def.name.trim().is_empty() {
        return Err(missing("sweep name"));
    }
    if def.case_file.as_os_str().is_empty() {
        return Err(missing("case_file"));
    }
    if def.output.as_os_str().is_empty() {
        return Err(missing("output"));
    }
    if def.iterations == 0 {
        return Err(invalid("iterations", "0", "must be positive"));
    }

    if def.solver.command.trim().is_empty() {
        return Err(missing("solver.command"));
    }
    check_timeout("solver.command_timeout_s", def.solver.command_timeout_s)?;
    if let Some(t) = def.solver.iterate_timeout_s {
        check_timeout("solver.iterate_timeout_s", t)?;
    }

    for model in &def.models {
        token("models.name", &model.name)?;
        for (key, value) in &model.options {
            token(&format!("models.{}.options", model.name), key)?;
            setting(&format!("models.{}.options.{}", model.name, key), value)?;
        }
    }

    for fixed in &def.fixed_boundaries {
        token("fixed_boundaries.surface", &fixed.surface)?;
        token("fixed_boundaries.key", &fixed.key)?;
        setting(
            &format!("fixed_boundaries.{}.{}", fixed.surface, fixed.key),
            &fixed.value,
        )?;
    }

    if def.dimensions.is_empty() {
        return Err(missing("at least one dimension"));
    }
    let mut dim_names = HashSet::new();
    let mut targets = HashSet::new();
    for dim in &def.dimensions {
        if !dim_names.insert(dim.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: dim.name.clone(),
                context: "dimensions".to_string(),
            });
        }
        token("dimensions.name", &dim.name)?;
        token("dimensions.surface", &dim.surface)?;
        token("dimensions.key", &dim.key)?;
        if !targets.insert((dim.surface.as_str(), dim.key.as_str())) {
            return Err(ValidationError::DuplicateId {
                id: format!("{}/{}", dim.surface, dim.key),
                context: "dimension boundary targets".to_string(),
            });
        }
        check_values(&dim.name, &dim.values)?;
    }

    if def.quantities.is_empty() {
        return Err(missing("at least one quantity"));
    }
    let mut quantity_names = HashSet::new();
    for q in &def.quantities {
        if !quantity_names.insert(q.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: q.name.clone(),
                context: "quantities".to_string(),
            });
        }
        token("quantities.name", &q.name)?;
        token("quantities.surface", &q.surface)?;
        token("quantities.field", &q.field)?;
    }
    check_columns(def)?;

    Ok(())
}

/// Every exported CSV column name must be unique once vector quantities are
/// flattened (`v` -> `v_x, v_y, v_z, v_mag`).
fn check_columns(def: &SweepDefinition) -> Result<(), ValidationError> {
    let schema = TableSchema {
        dimensions: def.dimensions.iter().map(|d| d.name.clone()).collect(),
        quantities: def
            .quantities
            .iter()
            .map(|q| QuantityColumn {
                name: q.name.clone(),
                kind: q.kind,
            })
            .collect(),
    };
    let mut columns = HashSet::new();
    for column in schema.header() {
        if !columns.insert(column.clone()) {
            return Err(ValidationError::DuplicateId {
                id: column,
                context: "result columns".to_string(),
            });
        }
    }
    Ok(())
}

fn check_values(dimension: &str, values: &ValuesDef) -> Result<(), ValidationError> {
    let field = format!("dimensions.{}.values", dimension);
    match values {
        ValuesDef::List(list) => {
            if list.is_empty() {
                return Err(invalid(&field, "[]", "needs at least one value"));
            }
            if let Some(v) = list.iter().find(|v| !v.is_finite()) {
                return Err(invalid(&field, &v.to_string(), "must be finite"));
            }
        }
        ValuesDef::Range {
            start, end, points, ..
        } => {
            if *points == 0 {
                return Err(invalid(&field, "points: 0", "needs at least one point"));
            }
            if !start.is_finite() || !end.is_finite() {
                return Err(invalid(
                    &field,
                    &format!("{}..{}", start, end),
                    "bounds must be finite",
                ));
            }
            if *points > 1 && start == end {
                return Err(invalid(
                    &field,
                    &format!("{}..{}", start, end),
                    "start and end must differ",
                ));
            }
        }
    }
    Ok(())
}

fn check_timeout(field: &str, seconds: f64) -> Result<(), ValidationError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(invalid(field, &seconds.to_string(), "must be a positive number of seconds"));
    }
    Ok(())
}

fn setting(field: &str, value: &SettingValue) -> Result<(), ValidationError> {
    match value {
        SettingValue::Number(v) if !v.is_finite() => {
            Err(invalid(field, &v.to_string(), "must be finite"))
        }
        SettingValue::Text(s) => token(field, s),
        _ => Ok(()),
    }
}

/// Names sent to the solver must be single whitespace-free tokens.
fn token(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid(field, "\"\"", "must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(field, value, "must not contain whitespace"));
    }
    Ok(())
}

fn invalid(field: &str, value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(what: &str) -> ValidationError {
    ValidationError::Missing {
        what: what.to_string(),
    }
}
