//! Reduction functions, post-processing functions and their registries
//!
//! Reductions collapse exactly one axis of an array; they are applied
//! independently per group by the engine. All reductions skip non-finite
//! values in the manner of the rest of the toolchain: cells with no valid
//! values reduce to NaN (counts reduce to 0). Post-processing functions are
//! pure elementwise maps applied to an aggregated field before writing.
//!
//! Both tables are closed and populated once at startup; unknown names fail
//! with a typed configuration error.

use crate::errors::{GridAggError, Result};
use crate::field::Field;
use ndarray::{ArrayD, Axis, Zip};
use std::collections::HashMap;
use std::sync::OnceLock;

type ReductionImpl = fn(&ArrayD<f64>, Axis) -> Result<ArrayD<f64>>;

/// A named, pure axis reduction in the reduction registry.
pub struct ReductionFn {
    pub name: &'static str,
    pub summary: &'static str,
    func: ReductionImpl,
}

impl ReductionFn {
    /// Reduce `data` along `axis`, producing an array of one rank less.
    pub fn reduce(&self, data: &ArrayD<f64>, axis: Axis) -> Result<ArrayD<f64>> {
        (self.func)(data, axis)
    }
}

static REDUCTION_REGISTRY: OnceLock<HashMap<&'static str, ReductionFn>> = OnceLock::new();

/// The closed table of reduction functions.
pub fn registry() -> &'static HashMap<&'static str, ReductionFn> {
    REDUCTION_REGISTRY.get_or_init(|| {
        let entries = [
            ReductionFn {
                name: "mean",
                summary: "arithmetic mean of finite values; NaN where none are finite",
                func: reduce_mean,
            },
            ReductionFn {
                name: "sum",
                summary: "sum of finite values",
                func: reduce_sum,
            },
            ReductionFn {
                name: "min",
                summary: "minimum of finite values; NaN where none are finite",
                func: reduce_min,
            },
            ReductionFn {
                name: "max",
                summary: "maximum of finite values; NaN where none are finite",
                func: reduce_max,
            },
            ReductionFn {
                name: "std",
                summary: "population standard deviation of finite values",
                func: reduce_std,
            },
            ReductionFn {
                name: "count",
                summary: "number of finite values",
                func: reduce_count,
            },
        ];
        entries.into_iter().map(|r| (r.name, r)).collect()
    })
}

/// Resolve a reduction function name against the registry. `total` is an
/// accepted alias for `sum`.
pub fn resolve(name: &str) -> Result<&'static ReductionFn> {
    let lookup = if name == "total" { "sum" } else { name };
    registry()
        .get(lookup)
        .ok_or_else(|| GridAggError::UnknownFunction {
            registry: "reduction",
            name: name.to_string(),
        })
}

fn reduce_sum(data: &ArrayD<f64>, axis: Axis) -> Result<ArrayD<f64>> {
    Ok(data.fold_axis(axis, 0.0f64, |&acc, &x| if x.is_finite() { acc + x } else { acc }))
}

fn reduce_count(data: &ArrayD<f64>, axis: Axis) -> Result<ArrayD<f64>> {
    Ok(data.fold_axis(axis, 0.0f64, |&acc, &x| if x.is_finite() { acc + 1.0 } else { acc }))
}

fn reduce_mean(data: &ArrayD<f64>, axis: Axis) -> Result<ArrayD<f64>> {
    let mut sum = reduce_sum(data, axis)?;
    let count = reduce_count(data, axis)?;
    sum.zip_mut_with(&count, |s, &c| {
        *s = if c > 0.0 { *s / c } else { f64::NAN };
    });
    Ok(sum)
}

fn reduce_min(data: &ArrayD<f64>, axis: Axis) -> Result<ArrayD<f64>> {
    let folded = data.fold_axis(axis, f64::INFINITY, |&acc, &x| {
        if x.is_finite() {
            acc.min(x)
        } else {
            acc
        }
    });
    // INFINITY survives only where no valid values were found
    Ok(folded.mapv(|x| if x == f64::INFINITY { f64::NAN } else { x }))
}

fn reduce_max(data: &ArrayD<f64>, axis: Axis) -> Result<ArrayD<f64>> {
    let folded = data.fold_axis(axis, f64::NEG_INFINITY, |&acc, &x| {
        if x.is_finite() {
            acc.max(x)
        } else {
            acc
        }
    });
    Ok(folded.mapv(|x| if x == f64::NEG_INFINITY { f64::NAN } else { x }))
}

fn reduce_std(data: &ArrayD<f64>, axis: Axis) -> Result<ArrayD<f64>> {
    let sum = reduce_sum(data, axis)?;
    let count = reduce_count(data, axis)?;
    let mut sumsq = data.fold_axis(axis, 0.0f64, |&acc, &x| {
        if x.is_finite() {
            acc + x * x
        } else {
            acc
        }
    });
    Zip::from(&mut sumsq).and(&sum).and(&count).for_each(|q, &s, &c| {
        *q = if c > 0.0 {
            let mean = s / c;
            (*q / c - mean * mean).max(0.0).sqrt()
        } else {
            f64::NAN
        };
    });
    Ok(sumsq)
}

/// A named, pure elementwise function in the post-processing registry.
pub struct PostFn {
    pub name: &'static str,
    pub summary: &'static str,
    func: fn(f64) -> f64,
}

impl PostFn {
    /// Apply the function elementwise, returning a new field.
    pub fn apply(&self, field: &Field) -> Field {
        let mut out = field.clone();
        out.data = field.data.mapv(self.func);
        out
    }
}

static POST_REGISTRY: OnceLock<HashMap<&'static str, PostFn>> = OnceLock::new();

/// The closed table of post-processing functions.
pub fn post_registry() -> &'static HashMap<&'static str, PostFn> {
    POST_REGISTRY.get_or_init(|| {
        let entries = [
            PostFn {
                name: "abs",
                summary: "absolute value",
                func: f64::abs,
            },
            PostFn {
                name: "sqrt",
                summary: "square root; NaN for negative values",
                func: f64::sqrt,
            },
            PostFn {
                name: "round",
                summary: "round to nearest integer",
                func: f64::round,
            },
        ];
        entries.into_iter().map(|p| (p.name, p)).collect()
    })
}

/// Resolve a post-processing function name against the registry.
pub fn resolve_post(name: &str) -> Result<&'static PostFn> {
    post_registry()
        .get(name)
        .ok_or_else(|| GridAggError::UnknownFunction {
            registry: "post-processing",
            name: name.to_string(),
        })
}
