//! sf-results: sweep result aggregation and persistence.

pub mod aggregate;
pub mod export;
pub mod hash;
pub mod manifest;
pub mod types;

pub use aggregate::ResultAggregator;
pub use export::{MISSING, to_csv_bytes, write_csv};
pub use hash::compute_sweep_id;
pub use manifest::{
    FailedPoint, SweepManifest, load_manifest, manifest_path_for, write_manifest,
};
pub use types::*;

use std::path::PathBuf;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("Schema mismatch at row {row}: expected [{expected}], found [{found}]")]
    SchemaMismatch {
        row: usize,
        expected: String,
        found: String,
    },

    #[error("Failed to write {path}: {source}")]
    IoWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
