// ABOUTME: In-memory engine for unit tests of lookup and transfer logic.
// ABOUTME: Records every call and can be told to fail individual operations.

use super::lookup::normalize_reference;
use super::traits::sealed::Sealed;
use super::traits::{ArchiveStream, ImageError, ImageOps, ImageSummary};
use crate::types::{ImageId, ImageRef};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List(String),
    Tag { source: String, target: String },
    Export(String),
    Import,
}

/// Archives are `"{id}\n{reference}"`, split across two chunks.
#[derive(Default)]
pub(crate) struct FakeEngine {
    images: Mutex<Vec<ImageSummary>>,
    calls: Mutex<Vec<Call>>,
    fail_list: bool,
    fail_tag: bool,
    fail_export: bool,
    stall_export: bool,
    fail_import: bool,
    imports_in_flight: AtomicUsize,
}

/// Counts an import as running until its future completes or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_image(self, id: &str, references: &[&str]) -> Self {
        self.images.lock().push(ImageSummary {
            id: ImageId::new(id),
            references: references.iter().map(|r| r.to_string()).collect(),
        });
        self
    }

    pub(crate) fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub(crate) fn failing_tag(mut self) -> Self {
        self.fail_tag = true;
        self
    }

    /// Export yields the first chunk, then breaks.
    pub(crate) fn failing_export(mut self) -> Self {
        self.fail_export = true;
        self
    }

    /// Export yields the first chunk, then never another.
    pub(crate) fn stalling_export(mut self) -> Self {
        self.stall_export = true;
        self
    }

    pub(crate) fn failing_import(mut self) -> Self {
        self.fail_import = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Whether any mutating or streaming call was made.
    pub(crate) fn touched(&self) -> bool {
        self.calls
            .lock()
            .iter()
            .any(|c| !matches!(c, Call::List(_)))
    }

    pub(crate) fn imports_in_flight(&self) -> usize {
        self.imports_in_flight.load(Ordering::SeqCst)
    }

    /// Id of the image `reference` points at, if any.
    pub(crate) fn id_of(&self, reference: &str) -> Option<String> {
        self.find(reference).map(|s| s.id.as_str().to_string())
    }

    fn find(&self, reference: &str) -> Option<ImageSummary> {
        let wanted = normalize_reference(reference);
        self.images
            .lock()
            .iter()
            .find(|s| s.references.iter().any(|r| normalize_reference(r) == wanted))
            .cloned()
    }

    /// Point `reference` at `id`, moving it off any other image.
    fn point(&self, reference: &str, id: &ImageId) {
        let mut images = self.images.lock();
        for summary in images.iter_mut() {
            summary.references.retain(|r| r != reference);
        }
        match images.iter_mut().find(|s| &s.id == id) {
            Some(summary) => summary.references.push(reference.to_string()),
            None => images.push(ImageSummary {
                id: id.clone(),
                references: vec![reference.to_string()],
            }),
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl Sealed for FakeEngine {}

#[async_trait]
impl ImageOps for FakeEngine {
    async fn list_images(&self, reference: &ImageRef) -> Result<Vec<ImageSummary>, ImageError> {
        self.record(Call::List(reference.full_name()));
        if self.fail_list {
            return Err(ImageError::ListFailed("engine unavailable".to_string()));
        }
        Ok(self
            .images
            .lock()
            .iter()
            .filter(|s| s.references.iter().any(|r| r.contains(reference.name())))
            .cloned()
            .collect())
    }

    async fn tag_image(&self, source: &ImageRef, target: &ImageRef) -> Result<(), ImageError> {
        self.record(Call::Tag {
            source: source.full_name(),
            target: target.full_name(),
        });
        if self.fail_tag {
            return Err(ImageError::TagFailed("permission denied".to_string()));
        }
        let found = self
            .find(&source.full_name())
            .ok_or_else(|| ImageError::NotFound(source.full_name()))?;
        self.point(&target.full_name(), &found.id);
        Ok(())
    }

    fn export_image(&self, reference: &ImageRef) -> ArchiveStream {
        self.record(Call::Export(reference.full_name()));
        if self.stall_export && self.find(&reference.full_name()).is_some() {
            let first = futures::stream::iter(vec![Ok::<_, ImageError>(Bytes::from("partial"))]);
            return Box::pin(first.chain(futures::stream::pending()));
        }
        let chunks: Vec<Result<Bytes, ImageError>> = match self.find(&reference.full_name()) {
            None => vec![Err(ImageError::NotFound(reference.full_name()))],
            Some(_) if self.fail_export => vec![
                Ok(Bytes::from("partial")),
                Err(ImageError::ExportFailed("connection reset".to_string())),
            ],
            Some(summary) => vec![
                Ok(Bytes::from(format!("{}\n", summary.id))),
                Ok(Bytes::from(reference.full_name())),
            ],
        };
        Box::pin(futures::stream::iter(chunks))
    }

    async fn import_image(&self, mut archive: ArchiveStream) -> Result<(), ImageError> {
        self.record(Call::Import);
        let _running = InFlight::enter(&self.imports_in_flight);
        let mut body = Vec::new();
        while let Some(chunk) = archive.next().await {
            body.extend_from_slice(&chunk?);
        }
        if self.fail_import {
            return Err(ImageError::ImportFailed("no space left on device".to_string()));
        }

        let text = String::from_utf8_lossy(&body);
        let (id, reference) = text
            .split_once('\n')
            .ok_or_else(|| ImageError::ImportFailed("malformed archive".to_string()))?;
        self.point(reference, &ImageId::new(id));
        Ok(())
    }
}
