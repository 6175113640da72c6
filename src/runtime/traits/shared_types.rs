// ABOUTME: Shared types used across engine trait definitions.
// ABOUTME: Image summaries, archive streams, and engine metadata.

use crate::types::ImageId;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use super::image::ImageError;

/// What an engine knows about one image: its identity and the references
/// that currently point at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub id: ImageId,
    pub references: Vec<String>,
}

impl ImageSummary {
    /// Same content identity, regardless of references.
    pub fn same_image(&self, other: &ImageSummary) -> bool {
        self.id == other.id
    }
}

/// A live, engine-produced image archive (`docker save` format).
pub type ArchiveStream = Pin<Box<dyn Stream<Item = Result<Bytes, ImageError>> + Send>>;

/// Engine version and platform.
#[derive(Debug, Clone)]
pub struct RuntimeMetadata {
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub os: String,
    pub arch: String,
}
