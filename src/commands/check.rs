// ABOUTME: Check command implementation.
// ABOUTME: Loads and validates the config, then prints the transfer it describes.

use super::load_config;
use hauler::error::Result;
use hauler::output::Output;
use hauler::transfer::Transfer;
use std::env;

/// Validate the config without touching any engine.
pub fn check(destination: Option<&str>, output: Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let config = load_config(&cwd, destination, None)?;
    let host = config.host_spec()?;

    output.progress(&format!("Host: {}", host));
    match &config.source {
        Some(source) => {
            let plan = Transfer::plan(source.clone(), &config.target_overrides())?;
            output.progress(&format!("Source: {}", plan.source()));
            output.progress(&format!("Target: {}", plan.target()));
        }
        None => output.progress("Source: (given on the command line)"),
    }

    let policy = config.policy();
    let mode = if policy.override_existing {
        "always send"
    } else if policy.compares_remote() {
        "skip when the remote image id matches"
    } else {
        "always send (no comparison)"
    };
    output.progress(&format!("Policy: {}", mode));
    if let Some(timeout) = config.timeout {
        output.progress(&format!("Timeout: {}s", timeout.as_secs()));
    }

    output.success("Configuration OK");
    Ok(())
}
