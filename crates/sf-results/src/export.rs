//! CSV export of result tables.
//!
//! Layout: one header row (see [`TableSchema::header`]), then one row per
//! record in table order. Vector quantities occupy four cells (x, y, z,
//! magnitude). Every cell of a missing quantity holds [`MISSING`].
//!
//! [`TableSchema::header`]: crate::types::TableSchema::header

use crate::types::{QuantitySample, ResultTable};
use crate::{ResultsError, ResultsResult};
use sf_core::magnitude;
use sf_session::{FieldKind, FieldValue};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Cell written for a quantity the solver did not deliver.
pub const MISSING: &str = "NA";

/// Serialize a table to CSV bytes.
pub fn to_csv_bytes(table: &ResultTable) -> ResultsResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.schema().header())?;

    for record in table.rows() {
        let mut row: Vec<String> = record.point().values().map(|v| v.to_string()).collect();
        for sample in record.quantities() {
            push_cells(&mut row, sample);
        }
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ResultsError::Csv(e.into_error().into()))
}

fn push_cells(row: &mut Vec<String>, sample: &QuantitySample) {
    match (sample.kind, sample.value) {
        (_, Some(FieldValue::Scalar(v))) => row.push(v.to_string()),
        (_, Some(FieldValue::Vector(v))) => {
            row.extend(v.iter().map(|c| c.to_string()));
            row.push(magnitude(v).to_string());
        }
        (FieldKind::Scalar, None) => row.push(MISSING.to_string()),
        (FieldKind::Vector, None) => row.extend((0..4).map(|_| MISSING.to_string())),
    }
}

/// Write a table to `path` as CSV.
///
/// The file is written next to the destination under a temporary name and
/// renamed into place, so an existing file at `path` is either fully replaced
/// or left untouched.
pub fn write_csv(table: &ResultTable, path: &Path) -> ResultsResult<()> {
    let bytes = to_csv_bytes(table)?;
    atomic_write(path, &bytes)?;
    info!(path = %path.display(), rows = table.len(), "Results exported");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("results"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write-then-rename. The temporary file is removed again on failure.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> ResultsResult<()> {
    let temp = temp_path(path);
    let result = fs::write(&temp, content).and_then(|_| fs::rename(&temp, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&temp);
        return Err(ResultsError::IoWrite {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
