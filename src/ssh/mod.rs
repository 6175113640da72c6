// ABOUTME: SSH transport to the remote engine host.
// ABOUTME: Agent or key authentication, known_hosts checks, and Unix socket tunnels.

mod client;
mod error;
mod forward;

pub use client::{CommandOutput, Session, SessionConfig};
pub use error::{Error, Result};
