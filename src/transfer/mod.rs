// ABOUTME: Image transfer orchestration using the type state pattern.
// ABOUTME: Lookup, idempotency check, tag, and export-to-import streaming between two engines.

mod error;
mod image_transfer;
mod push;
mod state;
mod transitions;

pub use error::{TransferError, TransferErrorKind};
pub use image_transfer::{TargetOverrides, Transfer, TransferOutcome};
pub use push::{PushRequest, TransferPolicy, push, run};
pub use state::{Completed, Divergent, Planned, SourceResolved, Tagged};
pub use transitions::Checked;
