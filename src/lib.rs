// ABOUTME: Library root for hauler - moves container images between engines over SSH.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod runtime;
pub mod ssh;
pub mod transfer;
pub mod types;
