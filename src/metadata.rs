//! Dataset inspection and field description
//!
//! Printing helpers for examining a dataset's structure before running an
//! aggregation.

use crate::dataset::Dataset;
use crate::field::Field;

/// Prints dimensions, variables and global attributes of a dataset.
pub fn print_dataset(ds: &Dataset) {
    println!("\n===== Dimensions =====");
    if ds.dimensions.is_empty() {
        println!("   (No dimensions found)");
    }
    for (name, len) in &ds.dimensions {
        println!("    {} = {}", name, len);
    }

    println!("\n===== Variables =====");
    if ds.variables.is_empty() {
        println!("   (No variables found)");
    }
    for (name, field) in &ds.variables {
        let dims: Vec<String> = field
            .dims
            .iter()
            .zip(field.shape())
            .map(|(d, len)| format!("{}[{}]", d, len))
            .collect();
        println!("- {} ({})", name, dims.join(", "));
    }

    println!("\n===== Global Attributes =====");
    if ds.attributes.is_empty() {
        println!("   (No global attributes)");
    }
    for (name, value) in &ds.attributes {
        println!("- {}: {:?}", name, value);
    }
}

/// Prints quick statistics (min/mean/max) over a field's finite values.
pub fn print_field_summary(field: &Field) {
    let valid: Vec<f64> = field.data.iter().copied().filter(|x| x.is_finite()).collect();

    println!("\n Summary for field: {}", field.name);
    println!("================================");
    if valid.is_empty() {
        println!("   (No finite values)");
        return;
    }
    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    println!("   Min: {:.4}", min);
    println!("   Max: {:.4}", max);
    println!("   Mean: {:.4}", mean);
    println!("   Valid elements: {} / {}", valid.len(), field.data.len());
}
