// ABOUTME: Command module aggregator for the hauler CLI.
// ABOUTME: Re-exports push and check command handlers.

mod check;
mod push;

pub use check::check;
pub use push::push;

use hauler::config::Config;
use hauler::error::{Error, Result};
use std::path::Path;

/// Discover the config in `dir` and apply a named destination.
///
/// Without a config file, `fallback_host` alone is enough to build one.
pub(crate) fn load_config(
    dir: &Path,
    destination: Option<&str>,
    fallback_host: Option<&str>,
) -> Result<Config> {
    let config = match (Config::discover(dir), fallback_host) {
        (Ok(config), _) => config,
        (Err(Error::ConfigNotFound(_)), Some(host)) => Config::with_host(host),
        (Err(e), _) => return Err(e),
    };

    match destination {
        Some(name) => config.for_destination(name),
        None => Ok(config),
    }
}
