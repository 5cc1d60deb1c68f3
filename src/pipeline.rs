//! Pipeline driver
//!
//! Thin orchestration around the aggregation core: resolves function names
//! against the registries (before any I/O), opens the source dataset,
//! selects fields, runs groupby/apply per field and writes the result to the
//! target.

use crate::cli::Args;
use crate::engine;
use crate::errors::{GridAggError, Result};
use crate::field::Field;
use crate::group_index::GroupIndex;
use crate::grouping;
use crate::metadata::{print_dataset, print_field_summary};
use crate::netcdf_io::{open_dataset, NetcdfWriter};
use crate::reduction;

/// Run one invocation end to end.
pub fn run(args: Args) -> Result<()> {
    // Inspection-only invocations need no aggregation options.
    if args.list_vars {
        let dataset = open_dataset(&args.source.uri)?;
        print_dataset(&dataset);
        return Ok(());
    }

    let groupby = match (&args.groupby, &args.apply) {
        (Some(groupby), Some(_)) => groupby.clone(),
        (None, None) => {
            let dataset = open_dataset(&args.source.uri)?;
            print_dataset(&dataset);
            return Ok(());
        }
        _ => {
            return Err(GridAggError::Generic(
                "--groupby and --apply must be given together".to_string(),
            ))
        }
    };
    let apply_name = args.apply.as_deref().unwrap_or_default();

    // Resolve every name up front so a typo fails before any I/O is
    // attempted against the target.
    let grouping_fn = grouping::resolve(&groupby.function)?;
    let reduction_fn = reduction::resolve(apply_name)?;
    let post_fn = match &args.post {
        Some(name) => Some(reduction::resolve_post(name)?),
        None => None,
    };
    let target = args.target.as_deref().ok_or_else(|| {
        GridAggError::Generic("--target is required for aggregation".to_string())
    })?;

    let dataset = open_dataset(&args.source.uri)?;
    println!(
        "✅ Opened {} ({} variables)",
        args.source.uri.display(),
        dataset.variables.len()
    );
    if args.verbose {
        print_dataset(&dataset);
    }

    // Explicit field iteration order: the order given on the command line,
    // or all data variables lexicographically when none were named.
    let selected: Vec<String> = if args.source.fields.is_empty() {
        dataset.data_variable_names()
    } else {
        args.source.fields.clone()
    };
    if selected.is_empty() {
        return Err(GridAggError::Generic(
            "Source dataset contains no data variables".to_string(),
        ));
    }

    let mut outputs: Vec<Field> = Vec::with_capacity(selected.len());
    for name in &selected {
        let field = dataset.field(name)?;

        println!(
            "⚡ Grouping '{}' along '{}' with '{}'",
            name, groupby.coordinate, groupby.function
        );
        let index = GroupIndex::build(field, &groupby.coordinate, grouping_fn, &groupby.args)?;
        if args.verbose {
            println!(
                "   {} groups over {} positions",
                index.len(),
                index.total_positions()
            );
        }

        println!("⚡ Reducing {} groups with '{}'", index.len(), apply_name);
        let mut aggregated = engine::apply(field, &index, reduction_fn)?;
        if let Some(post) = post_fn {
            aggregated = post.apply(&aggregated);
        }
        if args.verbose {
            print_field_summary(&aggregated);
        }
        outputs.push(aggregated);
    }

    NetcdfWriter::new(target).write_fields(&outputs, &dataset)?;
    println!("✅ Saved result to {}", target.display());

    Ok(())
}
