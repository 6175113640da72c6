// ABOUTME: Entry point for the hauler CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use hauler::config;
use hauler::error::Result;
use hauler::output::Output;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = cli.output_mode();

    if let Err(e) = run(cli.command, Output::new(mode)).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: Output) -> Result<()> {
    match command {
        Commands::Init {
            host,
            source,
            force,
        } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, host.as_deref(), source.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Push(args) => commands::push(args, output).await,
        Commands::Check { destination } => commands::check(destination.as_deref(), output),
    }
}
