//! Partitioning a coordinate dimension into groups
//!
//! A [`GroupIndex`] records, for one coordinate dimension of one field, which
//! index positions belong to which group key. It is always built fresh from
//! a field and is immutable afterwards; the engine consumes it to gather and
//! reduce per-group sub-arrays.

use crate::errors::{GridAggError, Result};
use crate::field::Field;
use crate::grouping::{GroupKey, GroupingFn};
use std::collections::HashMap;

/// An ordered, total, disjoint partition of the positions along one
/// coordinate dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupIndex {
    coordinate: String,
    function: String,
    args: Vec<String>,
    groups: Vec<(GroupKey, Vec<usize>)>,
    source_len: usize,
}

impl GroupIndex {
    /// Partition `field`'s positions along `coordinate` by the key the
    /// grouping function assigns to each coordinate value.
    ///
    /// Groups appear in first-occurrence order of their key, unless the
    /// grouping function declares a natural sort order, in which case keys
    /// are sorted ascending. Any grouping function failure aborts the whole
    /// build; no partial partition is returned.
    pub fn build(
        field: &Field,
        coordinate: &str,
        grouping: &GroupingFn,
        args: &[String],
    ) -> Result<Self> {
        if field.axis_of(coordinate).is_none() {
            return Err(GridAggError::CoordinateNotFound {
                field: field.name.clone(),
                coordinate: coordinate.to_string(),
            });
        }
        let values = field
            .coordinate(coordinate)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| GridAggError::CoordinateNotFound {
                field: field.name.clone(),
                coordinate: coordinate.to_string(),
            })?;

        let mut slots: HashMap<GroupKey, usize> = HashMap::new();
        let mut groups: Vec<(GroupKey, Vec<usize>)> = Vec::new();

        for (position, value) in values.iter().enumerate() {
            let key = grouping
                .key(value, args)
                .map_err(|e| annotate_position(e, coordinate, position))?;
            match slots.get(&key) {
                Some(&slot) => groups[slot].1.push(position),
                None => {
                    slots.insert(key.clone(), groups.len());
                    groups.push((key, vec![position]));
                }
            }
        }

        if grouping.sorted {
            groups.sort_by(|a, b| a.0.cmp(&b.0));
        }

        Ok(Self {
            coordinate: coordinate.to_string(),
            function: grouping.name.to_string(),
            args: args.to_vec(),
            groups,
            source_len: values.len(),
        })
    }

    /// Name of the grouped coordinate dimension.
    pub fn coordinate(&self) -> &str {
        &self.coordinate
    }

    /// Name of the grouping function that built this index.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Static arguments the grouping function was called with.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of distinct groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in output order: key plus positions along the grouped
    /// dimension.
    pub fn groups(&self) -> &[(GroupKey, Vec<usize>)] {
        &self.groups
    }

    /// Keys in output order.
    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.iter().map(|(key, _)| key)
    }

    /// Length of the coordinate dimension this index was built from.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Total number of partitioned positions across all groups. Equals
    /// [`source_len`](Self::source_len) by construction.
    pub fn total_positions(&self) -> usize {
        self.groups.iter().map(|(_, positions)| positions.len()).sum()
    }
}

fn annotate_position(error: GridAggError, coordinate: &str, position: usize) -> GridAggError {
    match error {
        GridAggError::Evaluation { function, detail } => GridAggError::Evaluation {
            function,
            detail: format!("{} (coordinate '{}', position {})", detail, coordinate, position),
        },
        other => other,
    }
}
