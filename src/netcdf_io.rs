//! NetCDF dataset adapter
//!
//! This module materializes a NetCDF file into an in-memory [`Dataset`]
//! (decoding CF-convention time coordinates into calendar timestamps) and
//! writes aggregated fields back out to a new NetCDF file with attribute
//! propagation and a `history` global attribute.
//!
//! The aggregation core never touches files; everything it sees has already
//! been materialized here.

use crate::dataset::{is_coordinate_variable, Dataset};
use crate::errors::{GridAggError, Result};
use crate::field::{CoordinateValues, Field};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use ndarray::ArrayD;
use netcdf::{create, open, AttributeValue};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::{fs, path::Path};

/// Open a NetCDF file and load every numeric variable into memory.
///
/// Variables whose values cannot be read as floats (e.g. string variables)
/// are skipped with a warning. A 1-D variable named after its dimension is
/// treated as that dimension's coordinate variable; if its `units` attribute
/// is a CF time units string it is decoded into timestamps.
pub fn open_dataset(path: &Path) -> Result<Dataset> {
    let file = open(path)?;
    let mut ds = Dataset::new();

    for attr in file.attributes() {
        if let Ok(value) = attr.value() {
            ds.attributes.insert(attr.name().to_string(), value);
        }
    }

    for var in file.variables() {
        let name = var.name().to_string();
        let dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let values = match var.get_values::<f64, _>(..) {
            Ok(v) => v,
            Err(e) => {
                println!("⚠ Skipping non-numeric variable '{}' ({})", name, e);
                continue;
            }
        };
        let data = ArrayD::from_shape_vec(shape, values)?;

        let mut field = Field::new(name, dims, data)?;
        for attr in var.attributes() {
            if let Ok(value) = attr.value() {
                field.attributes.insert(attr.name().to_string(), value);
            }
        }
        ds.add_field(field)?;
    }

    // Coordinate values are attached in a second pass so their order of
    // appearance in the file does not matter.
    let mut coord_table: HashMap<String, CoordinateValues> = HashMap::new();
    for (name, field) in &ds.variables {
        if !is_coordinate_variable(name, field) {
            continue;
        }
        let raw: Vec<f64> = field.data.iter().copied().collect();
        let values = match time_units(field) {
            Some(units) => match decode_cf_time(&raw, &units) {
                Ok(times) => CoordinateValues::Time(times),
                Err(e) => {
                    println!("⚠ Could not decode time coordinate '{}' ({})", name, e);
                    CoordinateValues::Numeric(raw)
                }
            },
            None => CoordinateValues::Numeric(raw),
        };
        coord_table.insert(name.clone(), values);
    }

    for field in ds.variables.values_mut() {
        for (axis, dim) in field.dims.clone().iter().enumerate() {
            if let Some(values) = coord_table.get(dim) {
                if values.len() == field.data.shape()[axis] {
                    field.coords.insert(dim.clone(), values.clone());
                }
            }
        }
    }

    Ok(ds)
}

fn time_units(field: &Field) -> Option<String> {
    match field.attributes.get("units") {
        Some(AttributeValue::Str(units)) if units.contains(" since ") => Some(units.clone()),
        _ => None,
    }
}

/// Decode CF time values (`<unit> since <epoch>`) into timestamps.
///
/// Supported units: days, hours, minutes, seconds (standard/proleptic
/// Gregorian calendar only; non-standard calendars like 360_day are not
/// handled).
pub fn decode_cf_time(values: &[f64], units: &str) -> Result<Vec<NaiveDateTime>> {
    let (unit, epoch_str) = units
        .split_once(" since ")
        .ok_or_else(|| GridAggError::Generic(format!("'{}' is not a CF time units string", units)))?;

    let seconds_per = match unit.trim().to_lowercase().as_str() {
        "days" | "day" | "d" => 86_400.0,
        "hours" | "hour" | "hr" | "h" => 3_600.0,
        "minutes" | "minute" | "min" | "mins" => 60.0,
        "seconds" | "second" | "sec" | "secs" | "s" => 1.0,
        other => {
            return Err(GridAggError::Generic(format!(
                "Unsupported time unit '{}'",
                other
            )))
        }
    };
    let epoch = parse_epoch(epoch_str.trim())?;

    values
        .iter()
        .map(|&v| {
            let millis = (v * seconds_per * 1000.0).round() as i64;
            epoch
                .checked_add_signed(Duration::milliseconds(millis))
                .ok_or_else(|| {
                    GridAggError::Generic(format!("Time value {} overflows the calendar", v))
                })
        })
        .collect()
}

fn parse_epoch(s: &str) -> Result<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
    for format in FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(t);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN));
    }
    Err(GridAggError::Generic(format!(
        "Could not parse time epoch '{}'",
        s
    )))
}

/// Writer for aggregated fields.
pub struct NetcdfWriter<'a> {
    output_path: &'a Path,
}

impl<'a> NetcdfWriter<'a> {
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    /// Write the given fields to a new NetCDF file.
    ///
    /// Dimensions are collected across all fields (conflicting lengths are
    /// rejected). For each dimension, the source dataset's coordinate
    /// variable is copied through when its length still matches; otherwise
    /// the field's own coordinate values (the group keys) are written.
    pub fn write_fields(&self, fields: &[Field], source: &Dataset) -> Result<()> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        let mut file = create(self.output_path)?;

        let mut dims: BTreeMap<String, usize> = BTreeMap::new();
        for field in fields {
            for (dim, &len) in field.dims.iter().zip(field.shape()) {
                match dims.get(dim) {
                    Some(&existing) if existing != len => {
                        return Err(GridAggError::DimensionConflict {
                            dim: dim.clone(),
                            existing,
                            requested: len,
                        });
                    }
                    Some(_) => {}
                    None => {
                        dims.insert(dim.clone(), len);
                    }
                }
            }
        }
        for (dim, &len) in &dims {
            file.add_dimension(dim, len)?;
        }

        let mut written: HashSet<String> = HashSet::new();
        for field in fields {
            for (dim, &len) in field.dims.iter().zip(field.shape()) {
                if written.contains(dim) {
                    continue;
                }
                if let Some(src) = source.variables.get(dim) {
                    if is_coordinate_variable(dim, src) && src.data.len() == len {
                        let mut var = file.add_variable::<f64>(dim, &[dim.as_str()])?;
                        for (name, value) in &src.attributes {
                            var.put_attribute(name, value.clone())?;
                        }
                        var.put(src.data.view(), ..)?;
                        written.insert(dim.clone());
                        continue;
                    }
                }
                if let Some(CoordinateValues::Numeric(values)) = field.coords.get(dim) {
                    let coord = ArrayD::from_shape_vec(vec![values.len()], values.clone())?;
                    let mut var = file.add_variable::<f64>(dim, &[dim.as_str()])?;
                    var.put(coord.view(), ..)?;
                    written.insert(dim.clone());
                }
            }
        }

        for field in fields {
            let dim_refs: Vec<&str> = field.dims.iter().map(|s| s.as_str()).collect();
            let mut var = file.add_variable::<f64>(&field.name, &dim_refs)?;

            // _FillValue must be written before data, with the variable's
            // own type
            if let Some(fv) = fill_value_f64(&field.attributes) {
                var.put_attribute("_FillValue", fv)?;
            }
            for (name, value) in &field.attributes {
                if name != "_FillValue" {
                    var.put_attribute(name, value.clone())?;
                }
            }
            var.put(field.data.view(), ..)?;
        }

        for (name, value) in &source.attributes {
            if name != "history" {
                file.add_attribute(name, value.clone())?;
            }
        }
        file.add_attribute(
            "history",
            format!("Created by gridagg on {}", Utc::now().to_rfc3339()),
        )?;

        Ok(())
    }
}

fn fill_value_f64(attributes: &HashMap<String, AttributeValue>) -> Option<f64> {
    attributes.get("_FillValue").and_then(|attr| match attr {
        AttributeValue::Double(v) => Some(*v),
        AttributeValue::Float(v) => Some(*v as f64),
        AttributeValue::Int(v) => Some(*v as f64),
        AttributeValue::Short(v) => Some(*v as f64),
        _ => None,
    })
}
