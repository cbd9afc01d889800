use crate::numeric::Real;
use core::fmt;

/// One named parameter value of a point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    pub name: String,
    pub value: Real,
}

/// One combination of parameter values, tagged with its visitation index.
///
/// Immutable once built: the grid hands out fresh points, nothing edits them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterPoint {
    index: usize,
    coordinates: Vec<Coordinate>,
}

impl ParameterPoint {
    pub fn new(index: usize, coordinates: Vec<Coordinate>) -> Self {
        Self { index, coordinates }
    }

    /// 0-based position in sweep visitation order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Value of the named dimension, if the point has it.
    pub fn value(&self, name: &str) -> Option<Real> {
        self.coordinates
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.coordinates.iter().map(|c| c.name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = Real> + '_ {
        self.coordinates.iter().map(|c| c.value)
    }
}

impl fmt::Display for ParameterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} (", self.index + 1)?;
        for (i, c) in self.coordinates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", c.name, c.value)?;
        }
        write!(f, ")")
    }
}
