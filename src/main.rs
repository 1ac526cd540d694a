use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory as _, Parser as _};

use dotstow::cli::Cli;
use dotstow::{commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let cli = Cli::parse();

    if !cli.has_action() {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    logging::init_subscriber(cli.verbose, cli.command_name());
    let log = Arc::new(logging::Logger::new(cli.command_name()));
    commands::install::run(&cli, &log)
}
