//! The aggregation engine
//!
//! Given a field, a group index built from it, and a reduction function,
//! [`apply`] gathers each group's sub-array along the grouped axis, reduces
//! it, and stacks the per-group results back into a new field whose grouped
//! dimension is replaced by the ordered group keys.
//!
//! Groups are independent, so reductions run in parallel across the Rayon
//! pool; assembly happens only after every group has completed and always in
//! group-key order. Any group failure aborts the whole call — no partial
//! result is ever observable, and the input field is never mutated.

use crate::errors::{GridAggError, Result};
use crate::field::{CoordinateValues, Field};
use crate::group_index::GroupIndex;
use crate::reduction::ReductionFn;
use ndarray::{ArrayD, Axis};
use netcdf::AttributeValue;
use rayon::prelude::*;

/// Reduce each group of `index` independently and assemble the aggregated
/// field.
pub fn apply(field: &Field, index: &GroupIndex, reduction: &ReductionFn) -> Result<Field> {
    let axis = field
        .axis_of(index.coordinate())
        .ok_or_else(|| GridAggError::GroupIndexMismatch {
            message: format!(
                "field '{}' has no dimension '{}'",
                field.name,
                index.coordinate()
            ),
        })?;

    let extent = field.shape()[axis];
    if index.source_len() != extent || index.total_positions() != extent {
        return Err(GridAggError::GroupIndexMismatch {
            message: format!(
                "index partitions {} positions but dimension '{}' of field '{}' has length {}",
                index.total_positions(),
                index.coordinate(),
                field.name,
                extent
            ),
        });
    }

    // Expected per-group shape: the input shape minus the grouped axis.
    let mut expected: Vec<usize> = field.shape().to_vec();
    expected.remove(axis);

    let reduced: Vec<ArrayD<f64>> = index
        .groups()
        .par_iter()
        .map(|(key, positions)| {
            let sub = field.data.select(Axis(axis), positions);
            let out = reduction.reduce(&sub, Axis(axis))?;
            if out.shape() != expected.as_slice() {
                return Err(GridAggError::ShapeMismatch {
                    group: key.to_string(),
                    expected: expected.clone(),
                    found: out.shape().to_vec(),
                });
            }
            Ok(out)
        })
        .collect::<Result<Vec<_>>>()?;

    let views: Vec<_> = reduced.iter().map(|r| r.view()).collect();
    let stacked = ndarray::stack(Axis(axis), &views)?;

    let mut out = Field::new(field.name.clone(), field.dims.clone(), stacked)?;

    // Untouched dimensions keep their coordinates; the grouped dimension
    // gets the ordered group keys instead.
    for (dim, values) in &field.coords {
        if dim != index.coordinate() {
            out.coords.insert(dim.clone(), values.clone());
        }
    }
    let numeric_keys: Option<Vec<f64>> = index.keys().map(|k| k.as_f64()).collect();
    let labels = numeric_keys.is_none();
    let coord_values = numeric_keys
        .unwrap_or_else(|| (0..index.len()).map(|i| i as f64).collect());
    out.coords.insert(
        index.coordinate().to_string(),
        CoordinateValues::Numeric(coord_values),
    );

    out.attributes = field.attributes.clone();
    out.attributes.insert(
        "cell_methods".to_string(),
        AttributeValue::Str(format!("{}: {}", index.coordinate(), reduction.name)),
    );
    if labels {
        let joined = index
            .keys()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(",");
        out.attributes
            .insert("group_keys".to_string(), AttributeValue::Str(joined));
    }

    Ok(out)
}
