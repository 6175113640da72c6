// ABOUTME: SSH session management using russh.
// ABOUTME: Handles connection, authentication, remote commands, and socket forwards.

use super::error::{Error, Result};
use super::forward::ForwardHandle;
use crate::types::HostSpec;
use parking_lot::Mutex;
use russh::client::{self, Config, Handle};
use russh::keys::agent::client::AgentClient;
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::{ChannelMsg, Disconnect};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;

const DEFAULT_KEY_NAMES: [&str; 3] = ["id_ed25519", "id_rsa", "id_ecdsa"];

/// Configuration for establishing an SSH session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Explicit private key. When unset the agent is tried, then `~/.ssh` defaults.
    pub key_path: Option<PathBuf>,
    /// Accept and record host keys missing from known_hosts.
    pub trust_on_first_use: bool,
    /// Alternate known_hosts file (default: `~/.ssh/known_hosts`).
    pub known_hosts_path: Option<PathBuf>,
    pub command_timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            key_path: None,
            trust_on_first_use: false,
            known_hosts_path: None,
            command_timeout: Duration::from_secs(60),
        }
    }

    /// Session settings for a parsed `ssh://` host.
    pub fn for_host(spec: &HostSpec) -> Self {
        Self::new(spec.host(), spec.user_or_default()).port(spec.port())
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn trust_on_first_use(mut self, tofu: bool) -> Self {
        self.trust_on_first_use = tofu;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Output from a remote command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: u32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Host key verification for russh.
pub(crate) struct SshHandler {
    host: String,
    port: u16,
    trust_on_first_use: bool,
    known_hosts_path: Option<PathBuf>,
}

impl SshHandler {
    fn from_config(config: &SessionConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            trust_on_first_use: config.trust_on_first_use,
            known_hosts_path: config.known_hosts_path.clone(),
        }
    }

    fn learn(&self, key: &ssh_key::PublicKey) {
        let learned = match &self.known_hosts_path {
            Some(path) => learn_known_hosts_path(&self.host, self.port, key, path),
            None => learn_known_hosts(&self.host, self.port, key),
        };
        if let Err(e) = learned {
            tracing::warn!("failed to record host key for {}: {}", self.host, e);
        }
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let known = match &self.known_hosts_path {
            Some(path) => check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => check_known_hosts(&self.host, self.port, server_public_key),
        };

        match known {
            Ok(true) => Ok(true),
            // A changed key is never accepted, even with TOFU.
            Err(russh::keys::Error::KeyChanged { .. }) => {
                tracing::warn!("host key for {}:{} has changed", self.host, self.port);
                Ok(false)
            }
            Ok(false) if self.trust_on_first_use => {
                tracing::warn!(
                    "trusting unknown host key for {}:{} on first use",
                    self.host,
                    self.port
                );
                self.learn(server_public_key);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                tracing::debug!("known_hosts lookup failed: {}", e);
                Ok(self.trust_on_first_use)
            }
        }
    }
}

enum AuthMethod {
    Agent(AgentClient<UnixStream>),
    KeyFile(Arc<ssh_key::PrivateKey>),
}

/// An established SSH session to the engine host.
///
/// Owns every socket forward opened through it; [`Session::disconnect`]
/// stops them before closing the transport.
pub struct Session {
    config: SessionConfig,
    handle: Arc<Handle<SshHandler>>,
    forwarders: Mutex<Vec<ForwardHandle>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("forwarders", &self.forwarders.lock().len())
            .finish()
    }
}

impl Session {
    /// Connect and authenticate.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let auth = Self::resolve_auth_method(&config).await?;

        let russh_config = Config {
            inactivity_timeout: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        tracing::debug!("connecting to {}@{}:{}", config.user, config.host, config.port);
        let mut handle = client::connect(
            Arc::new(russh_config),
            (config.host.as_str(), config.port),
            SshHandler::from_config(&config),
        )
        .await
        .map_err(|e| Error::Connection(format!("{}:{}: {}", config.host, config.port, e)))?;

        if !Self::authenticate(&mut handle, &config, auth).await? {
            return Err(Error::AuthenticationFailed);
        }

        Ok(Self {
            config,
            handle: Arc::new(handle),
            forwarders: Mutex::new(Vec::new()),
        })
    }

    async fn resolve_auth_method(config: &SessionConfig) -> Result<AuthMethod> {
        if let Some(key_path) = &config.key_path {
            let key = load_secret_key(key_path, None).map_err(|e| Error::KeyLoadFailed {
                path: key_path.clone(),
                reason: e.to_string(),
            })?;
            return Ok(AuthMethod::KeyFile(Arc::new(key)));
        }

        if let Ok(agent) = AgentClient::connect_env().await {
            return Ok(AuthMethod::Agent(agent));
        }

        let home = std::env::var("HOME").map_err(|_| {
            Error::AgentUnavailable("SSH agent not available and HOME not set".to_string())
        })?;

        DEFAULT_KEY_NAMES
            .iter()
            .map(|name| PathBuf::from(&home).join(".ssh").join(name))
            .find_map(|path| load_secret_key(&path, None).ok())
            .map(|key| AuthMethod::KeyFile(Arc::new(key)))
            .ok_or_else(|| {
                Error::AgentUnavailable("SSH agent not available and no default keys found".to_string())
            })
    }

    async fn authenticate(
        handle: &mut Handle<SshHandler>,
        config: &SessionConfig,
        auth: AuthMethod,
    ) -> Result<bool> {
        match auth {
            AuthMethod::Agent(mut agent) => {
                let keys = agent.request_identities().await.map_err(|e| {
                    Error::AgentUnavailable(format!("failed to list agent keys: {}", e))
                })?;
                if keys.is_empty() {
                    return Err(Error::AgentUnavailable("no keys in SSH agent".to_string()));
                }

                for key in keys {
                    let accepted = handle
                        .authenticate_publickey_with(&config.user, key, None, &mut agent)
                        .await
                        .map(|r| r.success())
                        .unwrap_or(false);
                    if accepted {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            AuthMethod::KeyFile(key) => {
                let hash_alg = handle
                    .best_supported_rsa_hash()
                    .await
                    .map_err(Error::Protocol)?
                    .flatten();

                let result = handle
                    .authenticate_publickey(&config.user, PrivateKeyWithHashAlg::new(key, hash_alg))
                    .await
                    .map_err(Error::Protocol)?;
                Ok(result.success())
            }
        }
    }

    /// Check whether a path exists on the remote host.
    pub async fn file_exists(&self, path: &str) -> Result<bool> {
        let output = self.exec(&format!("test -e '{}' && echo exists", path)).await?;
        Ok(output.success() && output.stdout.trim() == "exists")
    }

    /// Run a command using the configured timeout.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput> {
        self.exec_with_timeout(command, self.config.command_timeout)
            .await
    }

    pub async fn exec_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        tokio::time::timeout(timeout, self.exec_inner(command))
            .await
            .map_err(|_| Error::CommandTimeout(timeout))?
    }

    async fn exec_inner(&self, command: &str) -> Result<CommandOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to open channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to exec {:?}: {}", command, e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;
        let mut eof = false;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                ChannelMsg::ExtendedData { data, ext: 1 } => stderr.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status } => {
                    exit_code = Some(exit_status);
                    if eof {
                        break;
                    }
                }
                ChannelMsg::Eof => {
                    eof = true;
                    if exit_code.is_some() {
                        break;
                    }
                }
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        // No exit status means the channel died underneath the command.
        let exit_code = exit_code.ok_or(Error::ChannelClosed)?;

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// Expose a remote Unix socket as a local one tunneled through this session.
    ///
    /// Returns the local socket path. The forward lives until the session is
    /// disconnected or dropped.
    pub async fn forward_socket(&self, remote_socket: &str) -> Result<String> {
        let forward =
            super::forward::start_forward(Arc::clone(&self.handle), remote_socket.to_string())
                .await?;
        let path = forward
            .path()
            .ok_or_else(|| Error::SocketForwardFailed("socket path is not valid UTF-8".to_string()))?
            .to_string();
        self.forwarders.lock().push(forward);
        Ok(path)
    }

    /// Stop all forwards and close the connection.
    pub async fn disconnect(self) -> Result<()> {
        let forwarders: Vec<_> = self.forwarders.lock().drain(..).collect();
        for forwarder in forwarders {
            forwarder.stop().await;
        }

        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Protocol)
    }
}
