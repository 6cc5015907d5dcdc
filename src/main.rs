//! peer-attr-check - BGP peer-group attribute inheritance checker
//!
//! Runs every catalog attribute through scripted member/group transitions
//! against the reference configuration model and reports each case.

use std::path::PathBuf;

use clap::Parser;
use peerattr::commands::{Commands, RunArgs};
use peerattr::{cli, common};

#[derive(Parser)]
#[command(
    name = "peer-attr-check",
    about = "Check BGP peer-group attribute inheritance"
)]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let cli = Cli::parse();
    common::logging::init_cli(cli.verbose);

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Run(RunArgs::default()));

    match cli::dispatch(command, cli.config.as_deref()) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
