// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use hauler::output::OutputMode;

#[derive(Parser)]
#[command(name = "hauler")]
#[command(about = "Move container images to remote Docker and Podman hosts over SSH")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new hauler.yml configuration file
    Init {
        /// Remote host (ssh://[user@]host[:port])
        #[arg(long)]
        host: Option<String>,

        /// Local image to push by default
        #[arg(long)]
        source: Option<String>,

        /// Overwrite an existing hauler.yml
        #[arg(short, long)]
        force: bool,
    },

    /// Transfer an image to the remote host
    Push(PushArgs),

    /// Validate the configuration and show what push would do
    Check {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PushArgs {
    /// Local image to push (overrides `source` in the config)
    pub source: Option<String>,

    /// Target destination (defined in config)
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Remote host (ssh://[user@]host[:port])
    #[arg(long)]
    pub host: Option<String>,

    /// Image name on the remote host
    #[arg(long)]
    pub image: Option<String>,

    /// Image tag on the remote host
    #[arg(long)]
    pub tag: Option<String>,

    /// Send the image even if the remote already has it
    #[arg(long)]
    pub override_existing: bool,

    /// Skip the transfer when the remote image id matches
    #[arg(long)]
    pub compare_checksum: bool,

    /// Abort the transfer after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
