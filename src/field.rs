//! Labeled n-dimensional fields
//!
//! A [`Field`] wraps one variable's data array together with its dimension
//! names, per-dimension coordinate values and attributes. Fields are the unit
//! the aggregation engine operates on: read-only views of dataset variables
//! on the way in, freshly constructed values on the way out.

use crate::errors::{GridAggError, Result};
use chrono::NaiveDateTime;
use ndarray::ArrayD;
use netcdf::AttributeValue;
use std::collections::HashMap;

/// Coordinate values labeling positions along one dimension.
///
/// Time coordinates are decoded from CF units strings into calendar
/// timestamps when a dataset is opened; everything else stays numeric.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateValues {
    Numeric(Vec<f64>),
    Time(Vec<NaiveDateTime>),
}

/// A single coordinate value, as handed to grouping functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordValue {
    Number(f64),
    Time(NaiveDateTime),
}

impl CoordinateValues {
    pub fn len(&self) -> usize {
        match self {
            CoordinateValues::Numeric(v) => v.len(),
            CoordinateValues::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<CoordValue> {
        match self {
            CoordinateValues::Numeric(v) => v.get(index).copied().map(CoordValue::Number),
            CoordinateValues::Time(v) => v.get(index).copied().map(CoordValue::Time),
        }
    }

    /// Iterate values in index order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = CoordValue> + '_> {
        match self {
            CoordinateValues::Numeric(v) => Box::new(v.iter().copied().map(CoordValue::Number)),
            CoordinateValues::Time(v) => Box::new(v.iter().copied().map(CoordValue::Time)),
        }
    }
}

/// A labeled n-dimensional array of numeric values.
///
/// Invariants enforced at construction: array rank equals the number of
/// dimension names, and each coordinate sequence's length equals the array
/// extent along its axis.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
    pub coords: HashMap<String, CoordinateValues>,
    pub attributes: HashMap<String, AttributeValue>,
}

impl Field {
    /// Create a field from dimension names and data, validating rank.
    pub fn new(name: impl Into<String>, dims: Vec<String>, data: ArrayD<f64>) -> Result<Self> {
        let name = name.into();
        if data.ndim() != dims.len() {
            return Err(GridAggError::Generic(format!(
                "Field '{}': {} dimension names given for a rank-{} array",
                name,
                dims.len(),
                data.ndim()
            )));
        }
        Ok(Self {
            name,
            dims,
            data,
            coords: HashMap::new(),
            attributes: HashMap::new(),
        })
    }

    /// Attach coordinate values to a named dimension, validating length.
    pub fn with_coordinate(mut self, dim: &str, values: CoordinateValues) -> Result<Self> {
        let axis = self
            .axis_of(dim)
            .ok_or_else(|| GridAggError::CoordinateNotFound {
                field: self.name.clone(),
                coordinate: dim.to_string(),
            })?;
        let extent = self.data.shape()[axis];
        if values.len() != extent {
            return Err(GridAggError::Generic(format!(
                "Field '{}': coordinate '{}' has {} values but the dimension extent is {}",
                self.name,
                dim,
                values.len(),
                extent
            )));
        }
        self.coords.insert(dim.to_string(), values);
        Ok(self)
    }

    /// Attach a variable attribute.
    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    /// Axis index of a named dimension, if present.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Coordinate values for a named dimension, if any were attached.
    pub fn coordinate(&self, dim: &str) -> Option<&CoordinateValues> {
        self.coords.get(dim)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Extent along a named dimension, if present.
    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.data.shape()[axis])
    }
}
