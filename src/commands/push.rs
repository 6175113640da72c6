// ABOUTME: Push command implementation.
// ABOUTME: Merges CLI flags over the config, runs the transfer, and reports the outcome.

use super::load_config;
use crate::cli::PushArgs;
use hauler::config::Config;
use hauler::error::{Error, Result};
use hauler::output::Output;
use hauler::transfer::{self, TransferOutcome};
use hauler::types::ImageRef;
use std::env;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Push one image to the configured host.
pub async fn push(args: PushArgs, mut output: Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let config = load_config(&cwd, args.destination.as_deref(), args.host.as_deref())?;
    let config = apply_flags(config, &args)?;

    let source = args
        .source
        .as_deref()
        .map(ImageRef::parse)
        .transpose()
        .map_err(|e| Error::InvalidConfig(format!("source: {e}")))?;
    let request = config.push_request(source)?;

    output.start_timer();
    output.progress(&format!("Pushing {} to {}", request.source, request.host));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling transfer");
            on_interrupt.cancel();
        }
    });

    let outcome = transfer::push(&request, &output, cancel).await?;

    match outcome {
        TransferOutcome::Transferred { target } => output.success(&format!("Pushed {target}")),
        TransferOutcome::Unchanged { target } => {
            output.success(&format!("{target} is already up to date"))
        }
    }
    Ok(())
}

/// Command-line flags win over file values.
fn apply_flags(mut config: Config, args: &PushArgs) -> Result<Config> {
    if let Some(ref host) = args.host {
        config.host = host.clone();
    }
    if args.image.is_some() {
        config.image = args.image.clone();
    }
    if args.tag.is_some() {
        config.tag = args.tag.clone();
    }
    if args.override_existing {
        config.override_existing = true;
    }
    if args.compare_checksum {
        config.compare_checksum = true;
    }
    if let Some(secs) = args.timeout {
        config.timeout = Some(Duration::from_secs(secs));
    }

    config.validate()?;
    Ok(config)
}
