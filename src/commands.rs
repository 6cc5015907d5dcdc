//! CLI command definitions
//!
//! Defines the clap commands for the conformance runner.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::testing::OutputFormat;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every catalog case and report the outcome (default)
    Run(RunArgs),

    /// List the expanded case descriptions
    List {
        /// YAML catalog to use instead of the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Only run cases whose description contains this text
    #[arg(long)]
    pub filter: Option<String>,

    /// YAML catalog to use instead of the built-in one
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Report format (overrides the config file)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Exit with status 1 when any case failed
    #[arg(long)]
    pub strict: bool,

    /// Plain glyphs without terminal colors
    #[arg(long)]
    pub no_color: bool,
}
