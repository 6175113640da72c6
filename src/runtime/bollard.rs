// ABOUTME: Bollard-based engine implementation.
// ABOUTME: Supports Docker and Podman via the Docker-compatible API, locally or over SSH.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ArchiveStream, ImageError, ImageOps, ImageSummary, RuntimeInfo, RuntimeInfoError,
    RuntimeMetadata,
};
use crate::runtime::types::{DetectedRuntime, RuntimeType};
use crate::ssh::Session;
use crate::types::{ImageId, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{ImportImageOptions, ListImagesOptions, TagImageOptions};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;

/// Seconds bollard waits for the response headers of one API request.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// The load endpoint answers only after it has read the whole archive, so the
/// import request gets no client-side limit. The caller's deadline bounds it.
const IMPORT_REQUEST_TIMEOUT: Duration = Duration::from_secs(u64::MAX);

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn is_not_found(e: &bollard::errors::Error) -> bool {
    matches!(
        e,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

/// An answering engine that refuses is not a connection problem.
fn map_info_error(e: bollard::errors::Error) -> RuntimeInfoError {
    match e {
        bollard::errors::Error::DockerResponseServerError { message, .. } => {
            RuntimeInfoError::Runtime(message)
        }
        other => RuntimeInfoError::ConnectionFailed(other.to_string()),
    }
}

fn map_tag_error(e: bollard::errors::Error, source: &ImageRef) -> ImageError {
    if is_not_found(&e) {
        ImageError::NotFound(source.full_name())
    } else {
        ImageError::TagFailed(e.to_string())
    }
}

fn map_export_error(e: bollard::errors::Error, reference: &str) -> ImageError {
    if is_not_found(&e) {
        ImageError::NotFound(reference.to_string())
    } else {
        ImageError::ExportFailed(e.to_string())
    }
}

fn map_import_error(e: bollard::errors::Error) -> ImageError {
    if let Some(export) = archive_failure(&e) {
        return export;
    }
    match e {
        bollard::errors::Error::DockerStreamError { error } => ImageError::ImportFailed(error),
        other => ImageError::ImportFailed(other.to_string()),
    }
}

/// The archive's own error when a broken request body is what ended the import.
fn archive_failure(e: &bollard::errors::Error) -> Option<ImageError> {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(e);
    while let Some(err) = cause {
        if let Some(found) = err.downcast_ref::<ImageError>() {
            return Some(found.clone());
        }
        let wrapped = err
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|inner| inner.downcast_ref::<ImageError>());
        if let Some(found) = wrapped {
            return Some(found.clone());
        }
        cause = err.source();
    }
    None
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Engine client over a Docker-compatible API socket.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to the local engine from ambient configuration.
    ///
    /// `DOCKER_HOST` wins when set; otherwise the detected socket is used.
    pub fn connect_local(detected: Option<&DetectedRuntime>) -> Result<Self, RuntimeInfoError> {
        match detected {
            Some(info) => {
                let client = Docker::connect_with_unix(
                    &info.socket_path,
                    REQUEST_TIMEOUT_SECS,
                    bollard::API_DEFAULT_VERSION,
                )
                .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
                Ok(Self::new(client, info.runtime_type))
            }
            None => {
                let client = Docker::connect_with_defaults()
                    .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
                Ok(Self::new(client, RuntimeType::Docker))
            }
        }
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }
}

impl std::fmt::Debug for BollardRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BollardRuntime")
            .field("runtime_type", &self.runtime_type)
            .finish()
    }
}

/// Connect to an engine on the far side of an SSH session.
///
/// Forwards the remote engine socket to a local one, builds a client over the
/// tunnel, and negotiates the API version with the remote daemon.
pub async fn connect_via_session(
    session: &Session,
    detected: &DetectedRuntime,
) -> Result<BollardRuntime, RuntimeInfoError> {
    let local_socket = session
        .forward_socket(&detected.socket_path)
        .await
        .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

    let client = Docker::connect_with_unix(
        &local_socket,
        REQUEST_TIMEOUT_SECS,
        bollard::API_DEFAULT_VERSION,
    )
    .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?
    .negotiate_version()
    .await
    .map_err(|e| RuntimeInfoError::ConnectionFailed(format!("API version negotiation: {}", e)))?;

    tracing::debug!(
        "negotiated API {} with remote {}",
        client.client_version(),
        detected.runtime_type
    );

    Ok(BollardRuntime::new(client, detected.runtime_type))
}

impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self.client.info().await.map_err(map_info_error)?;

        let name = match self.runtime_type {
            RuntimeType::Docker => "Docker".to_string(),
            RuntimeType::Podman => "Podman".to_string(),
        };

        Ok(RuntimeMetadata {
            name,
            version: info.server_version.unwrap_or_default(),
            api_version: self.client.client_version().to_string(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client.ping().await.map_err(map_info_error)?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn list_images(&self, reference: &ImageRef) -> Result<Vec<ImageSummary>, ImageError> {
        let mut filters: HashMap<String, Vec<String>> = HashMap::new();
        filters.insert("reference".to_string(), vec![reference.full_name()]);

        let opts = ListImagesOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };

        let images = self
            .client
            .list_images(Some(opts))
            .await
            .map_err(|e| ImageError::ListFailed(e.to_string()))?;

        Ok(images
            .into_iter()
            .map(|image| ImageSummary {
                id: ImageId::new(image.id),
                references: image.repo_tags,
            })
            .collect())
    }

    async fn tag_image(&self, source: &ImageRef, target: &ImageRef) -> Result<(), ImageError> {
        let opts = TagImageOptions {
            repo: Some(target.name().to_string()),
            tag: Some(target.tag().to_string()),
            ..Default::default()
        };

        self.client
            .tag_image(&source.full_name(), Some(opts))
            .await
            .map_err(|e| map_tag_error(e, source))
    }

    fn export_image(&self, reference: &ImageRef) -> ArchiveStream {
        let name = reference.full_name();
        let stream = self.client.export_image(&name);
        Box::pin(stream.map(move |chunk| chunk.map_err(|e| map_export_error(e, &name))))
    }

    async fn import_image(&self, archive: ArchiveStream) -> Result<(), ImageError> {
        let client = self.client.clone().with_timeout(IMPORT_REQUEST_TIMEOUT);
        let progress = client.import_image_stream(ImportImageOptions::default(), archive, None);
        drain_import(progress).await
    }
}

async fn drain_import<S>(progress: S) -> Result<(), ImageError>
where
    S: futures::Stream<Item = Result<bollard::models::BuildInfo, bollard::errors::Error>>,
{
    futures::pin_mut!(progress);
    while let Some(item) = progress.next().await {
        let info = item.map_err(map_import_error)?;
        if let Some(status) = info.stream.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            tracing::debug!("import: {}", status);
        }
    }
    Ok(())
}
