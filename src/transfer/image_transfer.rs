// ABOUTME: Generic transfer struct parameterized by state marker.
// ABOUTME: Holds the source and target references across every state.

use crate::types::ImageRef;

use super::error::TransferError;
use super::state::{Completed, Planned};

/// Optional replacements for the source's name and tag on the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOverrides {
    pub image: Option<String>,
    pub tag: Option<String>,
}

impl TargetOverrides {
    pub fn new(image: Option<String>, tag: Option<String>) -> Self {
        Self { image, tag }
    }
}

/// A transfer in progress, parameterized by its current state.
#[derive(Debug)]
pub struct Transfer<S> {
    pub(crate) source: ImageRef,
    pub(crate) target: ImageRef,
    pub(crate) state: S,
}

/// How a transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The image was streamed into the remote engine.
    Transferred { target: ImageRef },
    /// The remote already held the identical image.
    Unchanged { target: ImageRef },
}

impl TransferOutcome {
    pub fn target(&self) -> &ImageRef {
        match self {
            TransferOutcome::Transferred { target } | TransferOutcome::Unchanged { target } => {
                target
            }
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, TransferOutcome::Unchanged { .. })
    }
}

impl Transfer<Planned> {
    /// Work out the target reference for `source`.
    ///
    /// Each part of `destination` replaces the matching part of the source
    /// independently; missing or empty parts keep the source's.
    pub fn plan(source: ImageRef, destination: &TargetOverrides) -> Result<Self, TransferError> {
        let (name, tag) =
            source.override_parts(destination.image.as_deref(), destination.tag.as_deref());
        let target = ImageRef::new(name, tag).map_err(|e| TransferError::InvalidReference {
            reference: format!("{}:{}", name, tag),
            reason: e.to_string(),
        })?;

        tracing::debug!("planned transfer {} -> {}", source, target);
        Ok(Self {
            source,
            target,
            state: Planned,
        })
    }
}

impl<S> Transfer<S> {
    pub fn source(&self) -> &ImageRef {
        &self.source
    }

    pub fn target(&self) -> &ImageRef {
        &self.target
    }

    /// Whether the target is the source under the same name.
    pub fn is_self_tag(&self) -> bool {
        self.source == self.target
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl Transfer<Completed> {
    #[must_use = "the outcome reports whether anything was transferred"]
    pub fn finish(self) -> TransferOutcome {
        if self.state.unchanged {
            TransferOutcome::Unchanged {
                target: self.target,
            }
        } else {
            TransferOutcome::Transferred {
                target: self.target,
            }
        }
    }
}
