//! CLI command handling
//!
//! Loads configuration and catalog, runs the engine and prints reports.

use std::path::Path;

use tracing::{info, warn};

use crate::backend::BackendFactory;
use crate::bgp::Vty;
use crate::catalog::{self, CatalogEntry};
use crate::commands::{Commands, RunArgs};
use crate::common::config::Config;
use crate::common::Result;
use crate::testing::{run_catalog, Reporter, Summary};

/// Dispatch a CLI command and return the process exit status
pub fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<i32> {
    let config = Config::load(config_path)?;
    match command {
        Commands::Run(args) => run(args, &config),
        Commands::List { catalog } => {
            let entries = load_catalog(catalog.as_deref())?;
            for case in catalog::expand(&entries) {
                println!("{}", case.description());
            }
            Ok(0)
        }
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Vec<CatalogEntry>> {
    match path {
        Some(path) => catalog::load_file(path),
        None => Ok(catalog::builtin()),
    }
}

fn run(args: RunArgs, config: &Config) -> Result<i32> {
    let entries = load_catalog(args.catalog.as_deref())?;
    let format = args.format.unwrap_or(config.output.format);
    let color = config.output.color && !args.no_color;
    let strict = args.strict || config.run.strict;

    let factory: BackendFactory = Box::new(|| Box::new(Vty::new()));
    let reports = run_catalog(
        &entries,
        args.filter.as_deref(),
        &factory,
        &config.topology,
    );
    print!("{}", Reporter::new(format, color).render(&reports)?);

    let summary = Summary::of(&reports);
    if summary.failed > 0 {
        warn!(failed = summary.failed, total = summary.total, "some cases failed");
    } else {
        info!(total = summary.total, "all cases passed");
    }

    Ok(if strict && summary.failed > 0 { 1 } else { 0 })
}
