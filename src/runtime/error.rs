// ABOUTME: Engine connection error types with the SNAFU pattern.
// ABOUTME: Unifies SSH, detection, and API connection failures for programmatic handling.

use snafu::Snafu;

use super::detection::DetectionError;
use super::traits::RuntimeInfoError;

/// Failure to open an engine handle.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("SSH session failed: {source}"))]
    Ssh { source: crate::ssh::Error },

    #[snafu(display("engine detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("engine connection failed: {source}"))]
    Connection { source: RuntimeInfoError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// No engine socket found.
    NoRuntimeFound,
    /// SSH connect, auth, command, or tunnel failure.
    SshError,
    /// The engine API could not be reached or negotiated with.
    ConnectionFailed,
    /// The engine answered with an error.
    RuntimeOperation,
}

impl RuntimeError {
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Ssh { .. } => RuntimeErrorKind::SshError,
            RuntimeError::Detection { source } => match source {
                DetectionError::NoRuntimeFound => RuntimeErrorKind::NoRuntimeFound,
                DetectionError::Ssh(_) => RuntimeErrorKind::SshError,
            },
            RuntimeError::Connection { source } => match source {
                RuntimeInfoError::ConnectionFailed(_) => RuntimeErrorKind::ConnectionFailed,
                RuntimeInfoError::Runtime(_) => RuntimeErrorKind::RuntimeOperation,
            },
        }
    }
}

impl From<crate::ssh::Error> for RuntimeError {
    fn from(source: crate::ssh::Error) -> Self {
        RuntimeError::Ssh { source }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

impl From<RuntimeInfoError> for RuntimeError {
    fn from(source: RuntimeInfoError) -> Self {
        RuntimeError::Connection { source }
    }
}
