//! Centralized error handling for gridagg
//!
//! This module provides structured error types covering the three failure
//! classes of the aggregation core (configuration, evaluation, shape) plus
//! adapter-level I/O failures, enabling better error context and type safety.

use std::fmt;

/// Main error type for gridagg operations
#[derive(Debug)]
pub enum GridAggError {
    /// A grouping, reduction or post-processing function name was not found
    /// in its registry
    UnknownFunction { registry: &'static str, name: String },

    /// A coordinate dimension was not found on a field, or carries no
    /// coordinate values
    CoordinateNotFound { field: String, coordinate: String },

    /// A GroupIndex was applied to a field it was not built from
    GroupIndexMismatch { message: String },

    /// Malformed groupby specification (coordinate and function must both be
    /// present)
    InvalidGroupBy { spec: String },

    /// Requested field not present in the source dataset
    FieldNotFound { field: String },

    /// Output dimension already defined with a conflicting length
    DimensionConflict { dim: String, existing: usize, requested: usize },

    /// A grouping or reduction function failed during execution
    Evaluation { function: String, detail: String },

    /// Per-group reduced shapes disagree
    ShapeMismatch {
        group: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Generic error for everything else
    Generic(String),
}

impl GridAggError {
    /// True for errors caused by a bad request (unknown names, missing
    /// coordinates, malformed specs) rather than by data or I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GridAggError::UnknownFunction { .. }
                | GridAggError::CoordinateNotFound { .. }
                | GridAggError::GroupIndexMismatch { .. }
                | GridAggError::InvalidGroupBy { .. }
                | GridAggError::FieldNotFound { .. }
                | GridAggError::DimensionConflict { .. }
        )
    }
}

impl fmt::Display for GridAggError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridAggError::UnknownFunction { registry, name } => {
                write!(f, "Unknown {} function '{}'", registry, name)
            }
            GridAggError::CoordinateNotFound { field, coordinate } => {
                write!(
                    f,
                    "Coordinate '{}' not found on field '{}'",
                    coordinate, field
                )
            }
            GridAggError::GroupIndexMismatch { message } => {
                write!(f, "Group index mismatch: {}", message)
            }
            GridAggError::InvalidGroupBy { spec } => {
                write!(
                    f,
                    "Invalid groupby specification '{}': expected 'coordinate:function[,arg,...]'",
                    spec
                )
            }
            GridAggError::FieldNotFound { field } => {
                write!(f, "Field '{}' not found in dataset", field)
            }
            GridAggError::DimensionConflict { dim, existing, requested } => {
                write!(
                    f,
                    "Dimension '{}' already defined with length {} (requested {})",
                    dim, existing, requested
                )
            }
            GridAggError::Evaluation { function, detail } => {
                write!(f, "Function '{}' failed: {}", function, detail)
            }
            GridAggError::ShapeMismatch { group, expected, found } => {
                write!(
                    f,
                    "Reduced shape {:?} for group '{}' does not match expected {:?}",
                    found, group, expected
                )
            }
            GridAggError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            GridAggError::IoError(e) => write!(f, "I/O error: {}", e),
            GridAggError::ArrayError(e) => write!(f, "Array error: {}", e),
            GridAggError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            GridAggError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GridAggError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridAggError::NetCDFError(e) => Some(e),
            GridAggError::IoError(e) => Some(e),
            GridAggError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for GridAggError {
    fn from(error: netcdf::Error) -> Self {
        GridAggError::NetCDFError(error)
    }
}

impl From<std::io::Error> for GridAggError {
    fn from(error: std::io::Error) -> Self {
        GridAggError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for GridAggError {
    fn from(error: ndarray::ShapeError) -> Self {
        GridAggError::ArrayError(error)
    }
}

impl From<String> for GridAggError {
    fn from(error: String) -> Self {
        GridAggError::Generic(error)
    }
}

impl From<&str> for GridAggError {
    fn from(error: &str) -> Self {
        GridAggError::Generic(error.to_string())
    }
}

/// Result type alias for gridagg operations
pub type Result<T> = std::result::Result<T, GridAggError>;
