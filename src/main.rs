//! Entry point for the gridagg application.
//! Handles CLI parsing, thread pool setup, and dispatches to the pipeline.

use clap::Parser;
use gridagg::cli::Args;
use gridagg::parallel::{get_parallel_info, ParallelConfig};
use gridagg::pipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    println!(
        r#"
------------------------------------------------------------------
                           _     _
                 __ _ _ __(_) __| | __ _  __ _  __ _
                / _` | '__| |/ _` |/ _` |/ _` |/ _` |
               | (_| | |  | | (_| | (_| | (_| | (_| |
                \__, |_|  |_|\__,_|\__,_|\__, |\__, |
                |___/                    |___/ |___/
               Grouped NetCDF aggregation statistics
------------------------------------------------------------------
                        "#
    );

    ParallelConfig::new(args.threads).setup_global_pool()?;
    if args.verbose {
        get_parallel_info().print_info();
    }

    pipeline::run(args)?;

    Ok(())
}
