// ABOUTME: Engine handles for the local engine and remote engines reached over SSH.
// ABOUTME: A remote handle owns its SSH session, which owns the socket forward.

use super::bollard::{BollardRuntime, connect_via_session};
use super::detection::{detect_local, detect_remote};
use super::error::RuntimeError;
use super::traits::RuntimeInfo;
use super::types::{RemoteOptions, RuntimeConfig};
use crate::ssh::{Session, SessionConfig};
use crate::types::HostSpec;

/// An open connection to one engine's API.
///
/// Release with [`Engine::close`]. Dropping without closing still removes the
/// forwarded socket file, but does not say goodbye to the SSH server.
#[derive(Debug)]
pub struct Engine {
    runtime: BollardRuntime,
    session: Option<Session>,
    label: String,
}

impl Engine {
    /// Open the engine on this machine.
    ///
    /// Uses bollard's environment defaults when `DOCKER_HOST` is set, otherwise
    /// the first engine socket found locally.
    pub async fn open_local() -> Result<Self, RuntimeError> {
        let detected = match std::env::var_os("DOCKER_HOST") {
            Some(_) => None,
            None => Some(detect_local(None)?),
        };
        if let Some(found) = &detected {
            tracing::debug!("local {} engine at {}", found.runtime_type, found.socket_path);
        }

        let runtime = BollardRuntime::connect_local(detected.as_ref())?;
        runtime.ping().await?;

        Ok(Self {
            runtime,
            session: None,
            label: "local".to_string(),
        })
    }

    /// Open the engine on `host` through an SSH tunnel.
    ///
    /// The session is disconnected again if anything after the SSH handshake
    /// fails.
    pub async fn open_remote(host: &HostSpec, options: &RemoteOptions) -> Result<Self, RuntimeError> {
        let mut config =
            SessionConfig::for_host(host).trust_on_first_use(options.trust_first_connection);
        if let Some(key) = &options.key_path {
            config = config.key_path(key.clone());
        }

        let session = Session::connect(config).await?;

        match attach(&session, &options.runtime).await {
            Ok(runtime) => Ok(Self {
                runtime,
                session: Some(session),
                label: host.to_string(),
            }),
            Err(e) => {
                if let Err(disconnect) = session.disconnect().await {
                    tracing::warn!("failed to disconnect from {}: {}", host, disconnect);
                }
                Err(e)
            }
        }
    }

    pub fn runtime(&self) -> &BollardRuntime {
        &self.runtime
    }

    /// `local`, or the remote host's connection string.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_remote(&self) -> bool {
        self.session.is_some()
    }

    /// Release the engine connection, tearing down the tunnel for remote engines.
    pub async fn close(self) -> Result<(), RuntimeError> {
        let Self {
            runtime, session, ..
        } = self;
        drop(runtime);

        if let Some(session) = session {
            session.disconnect().await?;
        }
        Ok(())
    }
}

async fn attach(session: &Session, runtime: &RuntimeConfig) -> Result<BollardRuntime, RuntimeError> {
    let detected = detect_remote(session, Some(runtime)).await?;
    tracing::debug!(
        "remote {} engine at {}",
        detected.runtime_type,
        detected.socket_path
    );

    let client = connect_via_session(session, &detected).await?;
    client.ping().await?;
    Ok(client)
}
