//! Sweep manifest written next to the exported table.

use crate::export::atomic_write;
use crate::types::ResultTable;
use crate::ResultsResult;
use serde::{Deserialize, Serialize};
use sf_core::Coordinate;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A point whose run failed numerically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedPoint {
    pub index: usize,
    pub coordinates: Vec<Coordinate>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepManifest {
    pub sweep_id: String,
    pub name: String,
    pub tool_version: String,
    pub started_at: String,
    pub finished_at: String,
    pub case_file: PathBuf,
    pub iterations: u32,
    pub point_count: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_points: Vec<FailedPoint>,
    pub output: PathBuf,
}

impl SweepManifest {
    /// Fill the row statistics from a finished table.
    pub fn record_table(&mut self, table: &ResultTable) {
        self.point_count = table.len();
        self.failed_count = table.failed_count();
        self.completed_count = self.point_count - self.failed_count;
        self.failed_points = table
            .rows()
            .iter()
            .filter_map(|row| match row.outcome() {
                crate::RunOutcome::Failed { reason } => Some(FailedPoint {
                    index: row.point().index(),
                    coordinates: row.point().coordinates().to_vec(),
                    reason: reason.clone(),
                }),
                crate::RunOutcome::Completed => None,
            })
            .collect();
    }
}

/// `data.csv` -> `data.csv.manifest.json`
pub fn manifest_path_for(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("results"));
    name.push(".manifest.json");
    output.with_file_name(name)
}

pub fn write_manifest(path: &Path, manifest: &SweepManifest) -> ResultsResult<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    atomic_write(path, json.as_bytes())
}

pub fn load_manifest(path: &Path) -> ResultsResult<SweepManifest> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
