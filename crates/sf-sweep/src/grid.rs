//! Parameter grid generation.
//!
//! A grid is the Cartesian product of named dimensions, each an ordered list
//! of candidate values. Points are produced lazily in row-major order: the
//! first dimension varies slowest, the last fastest.

use crate::error::GridError;
use sf_core::{Coordinate, ParameterPoint, Real, Tolerances, ensure_finite, nearly_equal};
use std::fmt;

/// Spacing of a generated value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spacing {
    /// Uniformly spaced points
    #[default]
    Linear,
    /// Logarithmically spaced points
    Logarithmic,
}

/// A value range expanded into `points` candidate values.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSpec {
    pub start: Real,
    pub end: Real,
    pub points: usize,
    pub spacing: Spacing,
}

impl RangeSpec {
    pub fn linear(start: Real, end: Real, points: usize) -> Self {
        Self {
            start,
            end,
            points,
            spacing: Spacing::Linear,
        }
    }

    /// Generate all values in the range.
    pub fn generate_points(&self) -> Vec<Real> {
        match self.spacing {
            Spacing::Linear => self.generate_linear(),
            Spacing::Logarithmic => self.generate_logarithmic(),
        }
    }

    fn generate_linear(&self) -> Vec<Real> {
        if self.points == 0 {
            return Vec::new();
        }
        if self.points == 1 {
            return vec![self.start];
        }

        let delta = (self.end - self.start) / (self.points - 1) as Real;
        let mut points: Vec<Real> = (0..self.points)
            .map(|i| snap_decimal(self.start + i as Real * delta))
            .collect();

        // Ensure exact endpoint
        points[self.points - 1] = self.end;
        points
    }

    fn generate_logarithmic(&self) -> Vec<Real> {
        if self.points <= 1 {
            return self.generate_linear();
        }

        // Both bounds must be positive for log spacing
        if self.start <= 0.0 || self.end <= 0.0 {
            return self.generate_linear();
        }

        let log_start = self.start.ln();
        let log_delta = (self.end.ln() - log_start) / (self.points - 1) as Real;
        let mut points: Vec<Real> = (0..self.points)
            .map(|i| snap_decimal((log_start + i as Real * log_delta).exp()))
            .collect();

        // Ensure exact endpoints
        points[0] = self.start;
        points[self.points - 1] = self.end;
        points
    }
}

/// Round to 15 significant digits, so accumulated error such as
/// `0.30000000000000004` becomes `0.3`.
fn snap_decimal(v: Real) -> Real {
    format!("{:.14e}", v).parse().unwrap_or(v)
}

/// One named sweep dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub values: Vec<Real>,
}

impl Dimension {
    pub fn new(name: impl Into<String>, values: Vec<Real>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn from_range(name: impl Into<String>, range: &RangeSpec) -> Self {
        Self::new(name, range.generate_points())
    }
}

/// Cartesian product of dimensions, visited in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    dimensions: Vec<Dimension>,
    len: usize,
}

impl ParameterGrid {
    /// Build a grid. Fails if there are no dimensions, a dimension is empty,
    /// names repeat, a value is non-finite, or a dimension repeats a value.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self, GridError> {
        if dimensions.is_empty() {
            return Err(GridError::Invalid {
                reason: "grid has no dimensions".to_string(),
            });
        }

        let mut len: usize = 1;
        for (i, dim) in dimensions.iter().enumerate() {
            if dim.name.trim().is_empty() {
                return Err(GridError::Invalid {
                    reason: format!("dimension #{} has an empty name", i + 1),
                });
            }
            if dimensions[..i].iter().any(|d| d.name == dim.name) {
                return Err(GridError::Invalid {
                    reason: format!("dimension '{}' is declared twice", dim.name),
                });
            }
            if dim.values.is_empty() {
                return Err(GridError::Invalid {
                    reason: format!("dimension '{}' has no candidate values", dim.name),
                });
            }
            for (j, &v) in dim.values.iter().enumerate() {
                ensure_finite(v, &dim.name)?;
                if dim.values[..j]
                    .iter()
                    .any(|&w| nearly_equal(v, w, Tolerances::default()))
                {
                    return Err(GridError::Invalid {
                        reason: format!("dimension '{}' repeats value {}", dim.name, v),
                    });
                }
            }
            len = len
                .checked_mul(dim.values.len())
                .ok_or_else(|| GridError::Invalid {
                    reason: "grid has too many points".to_string(),
                })?;
        }

        Ok(Self { dimensions, len })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Total number of points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: construction rejects empty grids.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Point at a visitation index, if in range.
    pub fn point(&self, index: usize) -> Option<ParameterPoint> {
        if index >= self.len {
            return None;
        }

        let mut coordinates = Vec::with_capacity(self.dimensions.len());
        let mut rest = index;
        for dim in self.dimensions.iter().rev() {
            let n = dim.values.len();
            coordinates.push(Coordinate {
                name: dim.name.clone(),
                value: dim.values[rest % n],
            });
            rest /= n;
        }
        coordinates.reverse();

        Some(ParameterPoint::new(index, coordinates))
    }

    /// Lazily enumerate every point. Can be called any number of times.
    pub fn points(&self) -> GridPoints<'_> {
        GridPoints {
            grid: self,
            next: 0,
        }
    }
}

impl fmt::Display for ParameterGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = self
            .dimensions
            .iter()
            .map(|d| format!("{}[{}]", d.name, d.values.len()))
            .collect::<Vec<_>>()
            .join(" x ");
        write!(f, "{} = {} points", shape, self.len)
    }
}

/// Iterator over the points of a [`ParameterGrid`].
#[derive(Debug, Clone)]
pub struct GridPoints<'a> {
    grid: &'a ParameterGrid,
    next: usize,
}

impl Iterator for GridPoints<'_> {
    type Item = ParameterPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.grid.point(self.next)?;
        self.next += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridPoints<'_> {}
