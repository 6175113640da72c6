// ABOUTME: Engine socket detection for local and remote hosts.
// ABOUTME: Probes rootless Podman, rootful Podman, then Docker unless overridden.

use super::types::{DetectedRuntime, RuntimeConfig, RuntimeType};
use crate::ssh::Session;
use std::path::Path;

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container engine found (checked Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("SSH error: {0}")]
    Ssh(#[from] crate::ssh::Error),
}

fn rootless_podman(uid: &str) -> String {
    format!("/run/user/{}/podman/podman.sock", uid)
}

fn default_socket_path(runtime: RuntimeType) -> String {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET.to_string(),
        RuntimeType::Podman => ROOTFUL_PODMAN.to_string(),
    }
}

/// Explicit override, if `config` names a runtime.
fn from_override(config: Option<&RuntimeConfig>) -> Option<DetectedRuntime> {
    let cfg = config?;
    let runtime_type = cfg.runtime?;
    Some(DetectedRuntime {
        runtime_type,
        socket_path: cfg
            .socket
            .clone()
            .unwrap_or_else(|| default_socket_path(runtime_type)),
    })
}

/// Ordered candidates for a host whose user id is `uid`.
fn candidates(uid: Option<&str>) -> Vec<DetectedRuntime> {
    let mut found = Vec::with_capacity(3);
    if let Some(uid) = uid {
        found.push(DetectedRuntime {
            runtime_type: RuntimeType::Podman,
            socket_path: rootless_podman(uid),
        });
    }
    found.push(DetectedRuntime {
        runtime_type: RuntimeType::Podman,
        socket_path: ROOTFUL_PODMAN.to_string(),
    });
    found.push(DetectedRuntime {
        runtime_type: RuntimeType::Docker,
        socket_path: DOCKER_SOCKET.to_string(),
    });
    found
}

/// Find the engine socket on this machine.
pub fn detect_local(config: Option<&RuntimeConfig>) -> Result<DetectedRuntime, DetectionError> {
    if let Some(explicit) = from_override(config) {
        return Ok(explicit);
    }

    candidates(local_uid().as_deref())
        .into_iter()
        .find(|c| Path::new(&c.socket_path).exists())
        .ok_or(DetectionError::NoRuntimeFound)
}

fn local_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()?
            .lines()
            .find(|l| l.starts_with("Uid:"))?
            .split_whitespace()
            .nth(1)
            .map(str::to_string)
    })
}

/// Find the engine socket on the far side of an SSH session.
pub async fn detect_remote(
    session: &Session,
    config: Option<&RuntimeConfig>,
) -> Result<DetectedRuntime, DetectionError> {
    if let Some(explicit) = from_override(config) {
        return Ok(explicit);
    }

    let id = session.exec("id -u").await?;
    let uid = id.success().then(|| id.stdout.trim().to_string());

    for candidate in candidates(uid.as_deref()) {
        if session.file_exists(&candidate.socket_path).await? {
            return Ok(candidate);
        }
    }

    Err(DetectionError::NoRuntimeFound)
}
