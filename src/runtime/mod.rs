// ABOUTME: Container engine access for Docker and Podman, local or over SSH.
// ABOUTME: Detection, connection, image lookup, and the capability traits.

mod bollard;
mod detection;
mod engine;
mod error;
#[cfg(test)]
pub(crate) mod fake;
mod lookup;
pub mod traits;
mod types;

pub use self::bollard::{BollardRuntime, connect_via_session};
pub use detection::{DetectionError, detect_local, detect_remote};
pub use engine::Engine;
pub use error::{RuntimeError, RuntimeErrorKind};
pub use lookup::{LookupError, lookup};
pub use traits::{
    ArchiveStream, ImageError, ImageOps, ImageSummary, RuntimeInfo, RuntimeInfoError,
    RuntimeMetadata,
};
pub use types::{DetectedRuntime, RemoteOptions, RuntimeConfig, RuntimeType};
