//! In-memory dataset model
//!
//! A [`Dataset`] is what the NetCDF adapter materializes a file into: named
//! dimensions, named variables (each a [`Field`]) and global attributes. The
//! aggregation core treats datasets as read-only; results are assembled into
//! fresh fields and written through the adapter.

use crate::errors::{GridAggError, Result};
use crate::field::Field;
use netcdf::AttributeValue;
use std::collections::{BTreeMap, HashMap};

/// An in-memory collection of dimensions and fields.
///
/// Variables are kept in a `BTreeMap` so every iteration over them is
/// lexicographic by name; field selection order is never incidental.
#[derive(Debug, Default)]
pub struct Dataset {
    pub dimensions: BTreeMap<String, usize>,
    pub variables: BTreeMap<String, Field>,
    pub attributes: HashMap<String, AttributeValue>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.variables
            .get(name)
            .ok_or_else(|| GridAggError::FieldNotFound {
                field: name.to_string(),
            })
    }

    /// Add a field, registering its dimensions. Fails if a dimension is
    /// already defined with a different length.
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        for (dim, &len) in field.dims.iter().zip(field.shape()) {
            match self.dimensions.get(dim) {
                Some(&existing) if existing != len => {
                    return Err(GridAggError::DimensionConflict {
                        dim: dim.clone(),
                        existing,
                        requested: len,
                    });
                }
                Some(_) => {}
                None => {
                    self.dimensions.insert(dim.clone(), len);
                }
            }
        }
        self.variables.insert(field.name.clone(), field);
        Ok(())
    }

    /// Names of data variables (variables that are not coordinate
    /// variables), in lexicographic order.
    pub fn data_variable_names(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|(name, field)| !is_coordinate_variable(name, field))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// CF-style coordinate variable: a 1-D variable named after its only
/// dimension.
pub fn is_coordinate_variable(name: &str, field: &Field) -> bool {
    field.dims.len() == 1 && field.dims[0] == name
}
