// ABOUTME: Non-fatal findings collected while a push runs.
// ABOUTME: Teardown failures and interrupted loads, reported after the result.

use std::fmt;

use crate::types::ImageRef;

/// Warnings that leave a push's outcome unchanged but should reach the user.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning and log it.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Warnings in the order they were raised.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn ssh_disconnect(host: &str, reason: impl fmt::Display) -> Self {
        Self {
            kind: WarningKind::SshDisconnect,
            message: format!("SSH session to {} did not close cleanly: {}", host, reason),
        }
    }

    /// The remote load was cut off and may have stored some layers.
    pub fn partial_load(target: &ImageRef) -> Self {
        Self {
            kind: WarningKind::PartialLoad,
            message: format!(
                "the remote engine may hold a partial load of {}; push again to complete it",
                target
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    SshDisconnect,
    PartialLoad,
}
