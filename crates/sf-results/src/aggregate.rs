//! Incremental, append-only accumulation of result records.

use crate::types::{ResultRecord, ResultTable, TableSchema};
use crate::{ResultsError, ResultsResult};

/// Accumulates records into a [`ResultTable`].
///
/// The schema is fixed by the first appended record. Every later record must
/// carry the same dimensions and the same quantity names and kinds, in the
/// same order.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    table: ResultTable,
    schema_fixed: bool,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the row buffer for a sweep of known length.
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            table: ResultTable {
                schema: TableSchema::default(),
                rows: Vec::with_capacity(rows),
            },
            schema_fixed: false,
        }
    }

    /// Append one record. On schema mismatch the table is left unchanged.
    pub fn append(&mut self, record: ResultRecord) -> ResultsResult<()> {
        let schema = TableSchema::of(&record);
        if !self.schema_fixed {
            self.table.schema = schema;
            self.schema_fixed = true;
        } else if schema != self.table.schema {
            return Err(ResultsError::SchemaMismatch {
                row: self.table.rows.len(),
                expected: self.table.schema.to_string(),
                found: schema.to_string(),
            });
        }
        self.table.rows.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Borrow the table accumulated so far.
    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    /// Finish accumulation and hand out the table.
    pub fn export(self) -> ResultTable {
        self.table
    }
}
