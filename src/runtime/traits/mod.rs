// ABOUTME: Capability traits implemented by container engines.
// ABOUTME: ImageOps for lookup/tag/export/import and RuntimeInfo for liveness.

mod image;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;

pub use image::{ImageError, ImageOps};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;
