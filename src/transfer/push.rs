// ABOUTME: Transfer entry points: the engine-generic state machine run and the full push.
// ABOUTME: Push opens both engines, runs the transfer under cancellation, and always releases them.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::{Diagnostics, Warning};
use crate::output::Output;
use crate::runtime::{Engine, ImageOps, RemoteOptions, RuntimeError};
use crate::types::{HostSpec, ImageRef};

use super::error::TransferError;
use super::image_transfer::{TargetOverrides, Transfer, TransferOutcome};
use super::state::Planned;
use super::transitions::Checked;

const LOCAL_ENGINE: &str = "local engine";

/// When to skip sending an image the remote may already have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferPolicy {
    /// Always send, even when the remote holds the identical image.
    pub override_existing: bool,
    /// Compare image ids with the remote target before sending.
    pub compare_checksum: bool,
}

impl TransferPolicy {
    /// Override wins over comparison.
    pub fn compares_remote(&self) -> bool {
        self.compare_checksum && !self.override_existing
    }
}

/// Everything needed to push one image to one host.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub source: ImageRef,
    pub destination: TargetOverrides,
    /// `ssh://[user@]host[:port]`, parsed when the push starts.
    pub host: String,
    pub remote: RemoteOptions,
    pub policy: TransferPolicy,
    pub timeout: Option<Duration>,
}

impl PushRequest {
    pub fn new(source: ImageRef, host: impl Into<String>) -> Self {
        Self {
            source,
            destination: TargetOverrides::default(),
            host: host.into(),
            remote: RemoteOptions::default(),
            policy: TransferPolicy::default(),
            timeout: None,
        }
    }

    pub fn destination(mut self, destination: TargetOverrides) -> Self {
        self.destination = destination;
        self
    }

    pub fn remote(mut self, remote: RemoteOptions) -> Self {
        self.remote = remote;
        self
    }

    pub fn policy(mut self, policy: TransferPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Run a planned transfer against two already-open engines.
pub async fn run<L, R>(
    local: &L,
    remote: &R,
    plan: Transfer<Planned>,
    policy: TransferPolicy,
    output: &Output,
) -> Result<TransferOutcome, TransferError>
where
    L: ImageOps + ?Sized,
    R: ImageOps + ?Sized,
{
    let resolved = plan.resolve_source(local).await?;

    let divergent = if policy.compares_remote() {
        match resolved.check_remote(remote).await? {
            Checked::Unchanged(done) => {
                output.step("Nothing to do.", "Image not changed, skipping push");
                return Ok(done.finish());
            }
            Checked::Divergent(divergent) => divergent,
        }
    } else {
        resolved.assume_divergent()
    };

    if !divergent.is_self_tag() {
        output.progress(&format!(
            "Tagging image: {} as: {}",
            divergent.source(),
            divergent.target()
        ));
    }
    let tagged = divergent.tag(local).await?;

    output.progress("Pushing image to remote host");
    let completed = tagged.stream(local, remote).await?;

    Ok(completed.finish())
}

/// Push one image to a remote host.
///
/// The host is validated before any engine is touched. Both engines are
/// released on every path, including cancellation and timeout; release
/// failures are reported as warnings on `output`.
pub async fn push(
    request: &PushRequest,
    output: &Output,
    cancel: CancellationToken,
) -> Result<TransferOutcome, TransferError> {
    let host = HostSpec::parse(&request.host).map_err(|e| TransferError::InvalidHost {
        host: request.host.clone(),
        reason: e.to_string(),
    })?;
    let plan = Transfer::plan(request.source.clone(), &request.destination)?;
    let guard = Guard::new(&cancel, request.timeout);
    let mut diag = Diagnostics::default();

    let local = guard
        .run(async {
            Engine::open_local()
                .await
                .map_err(|e| connection_error(LOCAL_ENGINE, e))
        })
        .await?;

    let remote = guard
        .run(async {
            Engine::open_remote(&host, &request.remote)
                .await
                .map_err(|e| connection_error(&host.to_string(), e))
        })
        .await;
    let remote = match remote {
        Ok(engine) => engine,
        Err(e) => {
            release(local, &mut diag).await;
            report(&diag, output);
            return Err(e);
        }
    };

    let target = plan.target().clone();
    let result = guard
        .run(run(
            local.runtime(),
            remote.runtime(),
            plan,
            request.policy,
            output,
        ))
        .await;
    note_interrupted_load(&result, &target, &mut diag);

    release(remote, &mut diag).await;
    release(local, &mut diag).await;
    report(&diag, output);

    result
}

/// A broken stream leaves whatever the remote already loaded in place.
fn note_interrupted_load(
    result: &Result<TransferOutcome, TransferError>,
    target: &ImageRef,
    diag: &mut Diagnostics,
) {
    if let Err(TransferError::TransferStream { .. }) = result {
        diag.warn(Warning::partial_load(target));
    }
}

fn connection_error(host: &str, err: RuntimeError) -> TransferError {
    TransferError::Connection {
        host: host.to_string(),
        reason: err.to_string(),
    }
}

/// Only a remote engine's SSH teardown can fail.
async fn release(engine: Engine, diag: &mut Diagnostics) {
    let label = engine.label().to_string();
    if let Err(e) = engine.close().await {
        diag.warn(Warning::ssh_disconnect(&label, e));
    }
}

fn report(diag: &Diagnostics, output: &Output) {
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
}

/// Bounds each step by the caller's cancellation token and one shared deadline.
pub(crate) struct Guard<'a> {
    cancel: &'a CancellationToken,
    deadline: Option<(Instant, Duration)>,
}

impl<'a> Guard<'a> {
    pub(crate) fn new(cancel: &'a CancellationToken, timeout: Option<Duration>) -> Self {
        Self {
            cancel,
            deadline: timeout.map(|budget| (Instant::now() + budget, budget)),
        }
    }

    pub(crate) async fn run<T, F>(&self, work: F) -> Result<T, TransferError>
    where
        F: Future<Output = Result<T, TransferError>>,
    {
        let bounded = async {
            match self.deadline {
                Some((at, budget)) => tokio::time::timeout_at(at, work)
                    .await
                    .map_err(|_| TransferError::TimedOut(budget))?,
                None => work.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TransferError::Cancelled),
            result = bounded => result,
        }
    }
}
