// ABOUTME: Validated domain types shared by the engine and transfer layers.
// ABOUTME: Image references, SSH host specs, and phantom-typed ids.

mod host_spec;
mod id;
mod image_ref;

pub use host_spec::{DEFAULT_SSH_PORT, HostSpec, HostSpecError};
pub use id::{Id, ImageId, ImageMarker};
pub use image_ref::{DEFAULT_TAG, ImageRef, ParseImageRefError};
