// ABOUTME: Engine kinds, detected sockets, and remote connection options.
// ABOUTME: Docker and Podman are both driven through the Docker-compatible API.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The container engine behind a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Podman,
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeType::Docker => write!(f, "docker"),
            RuntimeType::Podman => write!(f, "podman"),
        }
    }
}

/// Where an engine's API socket was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedRuntime {
    pub runtime_type: RuntimeType,
    pub socket_path: String,
}

/// Explicit engine selection that bypasses socket probing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    pub runtime: Option<RuntimeType>,
    /// Socket path; defaults per runtime when only `runtime` is set.
    pub socket: Option<String>,
}

/// Everything needed to reach the remote engine besides the host itself.
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    pub runtime: RuntimeConfig,
    pub key_path: Option<PathBuf>,
    pub trust_first_connection: bool,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            key_path: None,
            trust_first_connection: true,
        }
    }
}
