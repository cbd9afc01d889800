//! Result data types.

use serde::{Deserialize, Serialize};
use sf_core::ParameterPoint;
use sf_session::{FieldKind, FieldValue};
use std::fmt;

/// How an attempted run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Failed { reason: String },
}

impl RunOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// One named result quantity of a run. `value` is `None` when the run or the
/// query failed.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantitySample {
    pub name: String,
    pub kind: FieldKind,
    pub value: Option<FieldValue>,
}

impl QuantitySample {
    pub fn present(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            kind: value.kind(),
            value: Some(value),
        }
    }

    pub fn missing(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: None,
        }
    }
}

/// One row of the result table: the originating point plus its quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    point: ParameterPoint,
    outcome: RunOutcome,
    quantities: Vec<QuantitySample>,
}

impl ResultRecord {
    pub fn new(
        point: ParameterPoint,
        outcome: RunOutcome,
        quantities: Vec<QuantitySample>,
    ) -> Self {
        Self {
            point,
            outcome,
            quantities,
        }
    }

    pub fn point(&self) -> &ParameterPoint {
        &self.point
    }

    pub fn outcome(&self) -> &RunOutcome {
        &self.outcome
    }

    pub fn quantities(&self) -> &[QuantitySample] {
        &self.quantities
    }

    pub fn quantity(&self, name: &str) -> Option<&QuantitySample> {
        self.quantities.iter().find(|q| q.name == name)
    }
}

/// A declared result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityColumn {
    pub name: String,
    pub kind: FieldKind,
}

/// Column layout shared by every row of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    pub dimensions: Vec<String>,
    pub quantities: Vec<QuantityColumn>,
}

impl TableSchema {
    /// Schema implied by a single record.
    pub fn of(record: &ResultRecord) -> Self {
        Self {
            dimensions: record.point().names().map(str::to_string).collect(),
            quantities: record
                .quantities()
                .iter()
                .map(|q| QuantityColumn {
                    name: q.name.clone(),
                    kind: q.kind,
                })
                .collect(),
        }
    }

    /// Flattened CSV header: dimensions, then quantity columns. Vector
    /// quantities expand to `<name>_x`, `<name>_y`, `<name>_z`, `<name>_mag`.
    pub fn header(&self) -> Vec<String> {
        let mut header = self.dimensions.clone();
        for q in &self.quantities {
            match q.kind {
                FieldKind::Scalar => header.push(q.name.clone()),
                FieldKind::Vector => {
                    for suffix in ["x", "y", "z", "mag"] {
                        header.push(format!("{}_{}", q.name, suffix));
                    }
                }
            }
        }
        header
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self.dimensions.join(", ");
        let quantities = self
            .quantities
            .iter()
            .map(|q| format!("{}:{}", q.name, q.kind))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} | {}", dims, quantities)
    }
}

/// Ordered, append-only table of sweep results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    pub(crate) schema: TableSchema,
    pub(crate) rows: Vec<ResultRecord>,
}

impl ResultTable {
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Rows in sweep visitation order.
    pub fn rows(&self) -> &[ResultRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome().is_failed()).count()
    }
}
