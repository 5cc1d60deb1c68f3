//! gridagg: grouped aggregation statistics over NetCDF gridded datasets
//!
//! A Rust library for computing time/space aggregation statistics over
//! multidimensional gridded datasets (e.g. climate model output). One
//! coordinate dimension of a field is partitioned into groups by a named
//! grouping function, each group is reduced independently with a named
//! reduction function, and the collapsed result is written to a target
//! dataset.
//!
//! ## Key Features
//!
//! - **Grouping engine**: deterministic, total, disjoint partitioning of a
//!   coordinate dimension (calendar groupings, numeric binning)
//! - **Parallel reduction**: per-group reductions run across the Rayon pool
//! - **Closed registries**: function names resolve only against explicit
//!   tables, never through dynamic evaluation
//! - **NetCDF adapter**: CF time decoding on read, attribute propagation and
//!   provenance on write
//!
//! ## Module Organization
//!
//! - [`field`]: labeled arrays with dimension names and coordinate values
//! - [`dataset`]: the in-memory dataset model
//! - [`grouping`]: group keys, grouping functions and their registry
//! - [`group_index`]: partitioning a coordinate dimension into groups
//! - [`reduction`]: reduction/post-processing functions and registries
//! - [`engine`]: the per-group aggregation engine
//! - [`netcdf_io`]: the NetCDF dataset adapter
//! - [`metadata`]: dataset inspection and printing
//! - [`pipeline`]: the command-line pipeline driver
//! - [`parallel`]: parallel processing configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use gridagg::prelude::*;
//! use std::path::Path;
//!
//! // Open a NetCDF file into memory
//! let dataset = gridagg::netcdf_io::open_dataset(Path::new("data.nc")).unwrap();
//! let field = dataset.field("temperature").unwrap();
//!
//! // Group the time dimension by calendar month and reduce with a mean
//! let grouping = gridagg::grouping::resolve("yearmonth").unwrap();
//! let reduction = gridagg::reduction::resolve("mean").unwrap();
//! let index = GroupIndex::build(field, "time", grouping, &[]).unwrap();
//! let monthly = gridagg::engine::apply(field, &index, reduction).unwrap();
//! assert_eq!(monthly.len_of("time"), Some(index.len()));
//! ```

// Core modules
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod field;
pub mod group_index;
pub mod grouping;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod reduction;

// Boundary modules
pub mod cli;
pub mod pipeline;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::dataset::Dataset;
    pub use crate::errors::{GridAggError, Result};
    pub use crate::field::{CoordValue, CoordinateValues, Field};
    pub use crate::group_index::GroupIndex;
    pub use crate::grouping::{GroupKey, GroupingFn};
    pub use crate::netcdf_io::NetcdfWriter;
    pub use crate::parallel::ParallelConfig;
    pub use crate::reduction::{PostFn, ReductionFn};
}
