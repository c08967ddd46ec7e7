use anyhow::Result;
use clap::Parser;
use quire::ProjectDir;

mod cli_bin;

use cli_bin::args::{Cli, Commands};
use cli_bin::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let project = ProjectDir::open(cli.project.clone());

    match cli.command {
        Commands::Init => commands::init_command(&project)?,
        Commands::Add(args) => commands::add_command(project, args)?,
        Commands::Edit(args) => commands::edit_command(&project, args)?,
    }
    Ok(())
}

/// `RUST_LOG` wins over the verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
