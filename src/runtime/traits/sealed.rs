// ABOUTME: Sealed trait pattern for engine traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Only engine types inside this crate may implement the engine traits.
pub trait Sealed {}
