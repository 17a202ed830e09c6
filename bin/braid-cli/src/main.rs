//! CLI for inspecting multisig braids and deriving addresses from them.

mod cli;
mod config;
mod handlers;

use anyhow::{Error, Result};
use clap::Parser;
use multisig_braid_common::logging::{self, LoggerConfig};

use crate::handlers::{derive, inspect};

fn main() -> Result<(), Error> {
    logging::init(LoggerConfig::with_base_name("braid-cli"));

    let cli = cli::Cli::parse();
    match cli.command {
        cli::Commands::Inspect(args) => inspect::handle_inspect(args),
        cli::Commands::Derive(args) => derive::handle_derive(args),
    }
}
