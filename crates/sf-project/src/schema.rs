//! Sweep definition schema.

use serde::{Deserialize, Serialize};
use sf_session::{FieldKind, ModelOptions, SettingValue};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepDefinition {
    pub version: u32,
    pub name: String,
    /// Case file produced by the acquisition step.
    pub case_file: PathBuf,
    pub solver: SolverDef,
    #[serde(default)]
    pub models: Vec<ModelDef>,
    #[serde(default)]
    pub fixed_boundaries: Vec<FixedBoundaryDef>,
    pub dimensions: Vec<DimensionDef>,
    pub iterations: u32,
    pub quantities: Vec<QuantityDef>,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    #[serde(default = "default_command_timeout_s")]
    pub command_timeout_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterate_timeout_s: Option<f64>,
}

fn default_command_timeout_s() -> f64 {
    300.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    pub name: String,
    #[serde(default)]
    pub options: ModelOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedBoundaryDef {
    pub surface: String,
    pub key: String,
    pub value: SettingValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimensionDef {
    pub name: String,
    pub surface: String,
    pub key: String,
    pub values: ValuesDef,
}

/// Candidate values: an explicit list or a generated range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ValuesDef {
    List(Vec<f64>),
    Range {
        start: f64,
        end: f64,
        points: usize,
        #[serde(default)]
        spacing: SpacingDef,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpacingDef {
    #[default]
    Linear,
    Logarithmic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuantityDef {
    pub name: String,
    pub surface: String,
    pub field: String,
    #[serde(default = "default_quantity_kind")]
    pub kind: FieldKind,
}

fn default_quantity_kind() -> FieldKind {
    FieldKind::Vector
}
