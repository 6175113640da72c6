// ABOUTME: Image operations trait for container engines.
// ABOUTME: List by reference, tag, export as archive stream, import from stream.

use super::sealed::Sealed;
use super::shared_types::{ArchiveStream, ImageSummary};
use crate::types::ImageRef;
use async_trait::async_trait;

/// The image operations a transfer needs from one engine.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Images the engine matches for `reference`. Engine-side matching; callers
    /// that need exact matches must filter.
    async fn list_images(&self, reference: &ImageRef) -> Result<Vec<ImageSummary>, ImageError>;

    /// Add `target` as another reference to the image at `source`.
    async fn tag_image(&self, source: &ImageRef, target: &ImageRef) -> Result<(), ImageError>;

    /// Start exporting `reference` as an archive. Nothing is buffered; the
    /// engine is read as the stream is polled.
    fn export_image(&self, reference: &ImageRef) -> ArchiveStream;

    /// Load an archive into the engine's store, consuming it as it arrives.
    async fn import_image(&self, archive: ArchiveStream) -> Result<(), ImageError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("listing images failed: {0}")]
    ListFailed(String),

    #[error("tag failed: {0}")]
    TagFailed(String),

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("import failed: {0}")]
    ImportFailed(String),
}
