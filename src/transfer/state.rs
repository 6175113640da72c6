// ABOUTME: Transfer state marker types for the type state pattern.
// ABOUTME: Later states carry the resolved source so it cannot be missing.

use crate::runtime::ImageSummary;

/// Source and target references are known; nothing has been looked up.
/// Available actions: `resolve_source()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Planned;

/// The source image exists locally.
/// Available actions: `check_remote()`, `assume_divergent()`
#[derive(Debug, Clone)]
pub struct SourceResolved {
    pub(crate) source: ImageSummary,
}

/// The remote copy is missing, different, or was not compared.
/// Available actions: `tag()`
#[derive(Debug, Clone)]
pub struct Divergent {
    pub(crate) source: ImageSummary,
}

/// The source carries the target reference locally.
/// Available actions: `stream()`
#[derive(Debug, Clone)]
pub struct Tagged {
    pub(crate) source: ImageSummary,
}

/// Nothing left to do.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy)]
pub struct Completed {
    pub(crate) unchanged: bool,
}

macro_rules! source_accessor {
    ($($state:ty),*) => {
        $(
            impl $state {
                pub fn source(&self) -> &ImageSummary {
                    &self.source
                }
            }
        )*
    };
}

source_accessor!(SourceResolved, Divergent, Tagged);
