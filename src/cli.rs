//! Defines command-line interface options using `clap` for the gridagg
//! application.

use crate::errors::GridAggError;
use clap::Parser;
use std::path::PathBuf;

/// A CLI tool for grouped aggregation of NetCDF datasets
#[derive(Parser, Debug)]
#[command(
    version = "0.2.0",
    name = "gridagg",
    about = "Grouped time/space aggregation statistics over NetCDF datasets"
)]
pub struct Args {
    /// Source dataset, formatted as <uri>[:field1,field2,...]. Without an
    /// explicit field list, all data variables are aggregated in
    /// lexicographic name order.
    #[arg(value_parser = parse_source_spec)]
    pub source: SourceSpec,

    /// Path to write the aggregated dataset to
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Grouping specification, formatted as <coordinate>:<function>[,arg,...]
    #[arg(short, long, value_parser = parse_groupby_spec)]
    pub groupby: Option<GroupBySpec>,

    /// Reduction function applied to each group (mean, sum, min, max, std, count)
    #[arg(short, long)]
    pub apply: Option<String>,

    /// Post-processing function applied to the aggregated field before writing
    #[arg(short, long)]
    pub post: Option<String>,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// List all variables and dimensions in the source dataset
    #[arg(long)]
    pub list_vars: bool,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Parsed `<uri>[:field1,field2,...]` source argument.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub uri: PathBuf,
    /// Selected fields in the order given, duplicates removed. Empty means
    /// all data variables.
    pub fields: Vec<String>,
}

/// Parsed `<coordinate>:<function>[,arg,...]` groupby argument.
#[derive(Debug, Clone)]
pub struct GroupBySpec {
    pub coordinate: String,
    pub function: String,
    pub args: Vec<String>,
}

fn parse_source_spec(s: &str) -> Result<SourceSpec, String> {
    // A trailing ':' section without path separators is a field list;
    // anything else is part of the uri.
    if let Some((uri, fields)) = s.rsplit_once(':') {
        if !uri.is_empty() && !fields.is_empty() && !fields.contains('/') && !fields.contains('\\')
        {
            let mut selected: Vec<String> = Vec::new();
            for field in fields.split(',') {
                let field = field.trim();
                if field.is_empty() {
                    return Err("Empty field name in field list".to_string());
                }
                if !selected.iter().any(|f| f == field) {
                    selected.push(field.to_string());
                }
            }
            return Ok(SourceSpec {
                uri: PathBuf::from(uri),
                fields: selected,
            });
        }
    }
    if s.is_empty() {
        return Err("Empty source specification".to_string());
    }
    Ok(SourceSpec {
        uri: PathBuf::from(s),
        fields: Vec::new(),
    })
}

fn parse_groupby_spec(s: &str) -> Result<GroupBySpec, String> {
    let invalid = || {
        GridAggError::InvalidGroupBy {
            spec: s.to_string(),
        }
        .to_string()
    };
    let (coordinate, rest) = s.split_once(':').ok_or_else(invalid)?;
    if coordinate.is_empty() {
        return Err(invalid());
    }
    let mut parts = rest.split(',');
    let function = parts.next().unwrap_or("").trim().to_string();
    if function.is_empty() {
        return Err(invalid());
    }
    let args: Vec<String> = parts.map(|a| a.trim().to_string()).collect();
    Ok(GroupBySpec {
        coordinate: coordinate.to_string(),
        function,
        args,
    })
}
