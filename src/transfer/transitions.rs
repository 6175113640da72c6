// ABOUTME: State transition methods for image transfers.
// ABOUTME: Each method consumes self and returns the next state on success.

use crate::runtime::{ImageOps, lookup};

use super::error::TransferError;
use super::image_transfer::Transfer;
use super::state::{Completed, Divergent, Planned, SourceResolved, Tagged};

/// Result of comparing against the remote engine.
#[derive(Debug)]
pub enum Checked {
    /// The remote already holds the same image under the target reference.
    Unchanged(Transfer<Completed>),
    /// The image has to be sent.
    Divergent(Transfer<Divergent>),
}

impl<S> Transfer<S> {
    fn transition<T>(self, state: T) -> Transfer<T> {
        Transfer {
            source: self.source,
            target: self.target,
            state,
        }
    }
}

// =============================================================================
// Planned -> SourceResolved
// =============================================================================

impl Transfer<Planned> {
    /// Find the source image on the local engine.
    ///
    /// # Errors
    ///
    /// `SourceNotFound` when nothing matches, `AmbiguousReference` when more
    /// than one image does.
    pub async fn resolve_source<E>(self, local: &E) -> Result<Transfer<SourceResolved>, TransferError>
    where
        E: ImageOps + ?Sized,
    {
        let Some(source) = lookup(local, &self.source).await? else {
            return Err(TransferError::SourceNotFound {
                reference: self.source.full_name(),
            });
        };

        tracing::debug!("resolved {} to {}", self.source, source.id.short());
        Ok(self.transition(SourceResolved { source }))
    }
}

// =============================================================================
// SourceResolved -> Completed | Divergent
// =============================================================================

impl Transfer<SourceResolved> {
    /// Compare the source with whatever the remote engine has at the target.
    pub async fn check_remote<E>(self, remote: &E) -> Result<Checked, TransferError>
    where
        E: ImageOps + ?Sized,
    {
        let existing = lookup(remote, &self.target).await?;

        match existing {
            Some(found) if found.same_image(&self.state.source) => {
                tracing::debug!("remote {} is already {}", self.target, found.id.short());
                Ok(Checked::Unchanged(
                    self.transition(Completed { unchanged: true }),
                ))
            }
            Some(found) => {
                tracing::debug!(
                    "remote {} is {}, local is {}",
                    self.target,
                    found.id.short(),
                    self.state.source.id.short()
                );
                Ok(Checked::Divergent(self.assume_divergent()))
            }
            None => {
                tracing::debug!("remote has no {}", self.target);
                Ok(Checked::Divergent(self.assume_divergent()))
            }
        }
    }

    /// Skip the remote comparison and send the image regardless.
    pub fn assume_divergent(self) -> Transfer<Divergent> {
        let source = self.state.source.clone();
        self.transition(Divergent { source })
    }
}

// =============================================================================
// Divergent -> Tagged
// =============================================================================

impl Transfer<Divergent> {
    /// Give the local source image the target reference.
    ///
    /// A no-op when the target is the source reference itself.
    pub async fn tag<E>(self, local: &E) -> Result<Transfer<Tagged>, TransferError>
    where
        E: ImageOps + ?Sized,
    {
        if self.is_self_tag() {
            tracing::debug!("target equals source, not tagging");
        } else {
            local
                .tag_image(&self.source, &self.target)
                .await
                .map_err(|e| TransferError::Tag {
                    source_ref: self.source.full_name(),
                    target: self.target.full_name(),
                    reason: e.to_string(),
                })?;
            tracing::debug!("tagged {} as {}", self.source, self.target);
        }

        let source = self.state.source.clone();
        Ok(self.transition(Tagged { source }))
    }
}

// =============================================================================
// Tagged -> Completed
// =============================================================================

impl Transfer<Tagged> {
    /// Pipe the local export of the target straight into the remote import.
    ///
    /// # Errors
    ///
    /// `TransferStream` if either side fails. Whatever the remote engine
    /// already stored is left in place.
    pub async fn stream<L, R>(self, local: &L, remote: &R) -> Result<Transfer<Completed>, TransferError>
    where
        L: ImageOps + ?Sized,
        R: ImageOps + ?Sized,
    {
        let reference = self.target.full_name();
        let archive = local.export_image(&self.target);

        remote
            .import_image(archive)
            .await
            .map_err(|e| TransferError::stream(&reference, e))?;

        tracing::debug!("streamed {} to remote", reference);
        Ok(self.transition(Completed { unchanged: false }))
    }
}
