// ABOUTME: Engine metadata and liveness trait.
// ABOUTME: Version query and ping used right after a handle is opened.

use super::sealed::Sealed;
use super::shared_types::RuntimeMetadata;
use async_trait::async_trait;

#[async_trait]
pub trait RuntimeInfo: Sealed + Send + Sync {
    /// Engine version and platform.
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError>;

    /// Round-trip to the engine API.
    async fn ping(&self) -> Result<(), RuntimeInfoError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeInfoError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
