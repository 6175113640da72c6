// ABOUTME: Error types for image transfers.
// ABOUTME: Every variant names the host or reference it concerns.

use std::time::Duration;

use crate::runtime::{ImageError, LookupError};

/// Errors that end a transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The host connection string is not a usable `ssh://` URL.
    #[error("invalid host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    /// The destination name or tag does not form a valid reference.
    #[error("invalid destination reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// An engine could not be opened.
    #[error("failed to connect to {host}: {reason}")]
    Connection { host: String, reason: String },

    #[error("image not found: {reference}")]
    SourceNotFound { reference: String },

    #[error("multiple images found for: {reference} ({count} matches)")]
    AmbiguousReference { reference: String, count: usize },

    /// Listing images failed on one side.
    #[error("image lookup failed for {reference}: {reason}")]
    Lookup { reference: String, reason: String },

    #[error("failed to tag {source_ref} as {target}: {reason}")]
    Tag {
        source_ref: String,
        target: String,
        reason: String,
    },

    /// The export or the import side of the archive stream failed.
    #[error("failed to transfer {reference}: {reason}")]
    TransferStream { reference: String, reason: String },

    #[error("transfer cancelled")]
    Cancelled,

    #[error("transfer timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

/// Coarse error categories for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferErrorKind {
    InvalidInput,
    Connection,
    NotFound,
    Ambiguous,
    EngineOperation,
    Interrupted,
}

impl TransferError {
    pub fn kind(&self) -> TransferErrorKind {
        match self {
            TransferError::InvalidHost { .. } | TransferError::InvalidReference { .. } => {
                TransferErrorKind::InvalidInput
            }
            TransferError::Connection { .. } => TransferErrorKind::Connection,
            TransferError::SourceNotFound { .. } => TransferErrorKind::NotFound,
            TransferError::AmbiguousReference { .. } => TransferErrorKind::Ambiguous,
            TransferError::Lookup { .. }
            | TransferError::Tag { .. }
            | TransferError::TransferStream { .. } => TransferErrorKind::EngineOperation,
            TransferError::Cancelled | TransferError::TimedOut(_) => TransferErrorKind::Interrupted,
        }
    }

    pub(crate) fn stream(reference: &str, err: ImageError) -> Self {
        TransferError::TransferStream {
            reference: reference.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<LookupError> for TransferError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Ambiguous { reference, count } => {
                TransferError::AmbiguousReference { reference, count }
            }
            LookupError::Failed { reference, source } => TransferError::Lookup {
                reference,
                reason: source.to_string(),
            },
        }
    }
}
