#![forbid(unsafe_code)]

//! Manager error taxonomy.
//!
//! Every recoverable failure surfaces as a [`ManagerError`] so callers
//! and logs see the same vocabulary. None of these abort the manager;
//! the failing operation degrades (open fails, trap is skipped) and the
//! rest of the stack keeps working.

use tracing::{error, warn};

/// A recoverable failure inside the modal manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// An open request carried an empty or whitespace-only trigger id.
    InvalidTriggerId(String),
    /// A required document landmark was missing at setup.
    DocumentUnavailable(&'static str),
    /// A setup stage failed but the manager continued in degraded form.
    SetupFailure {
        stage: &'static str,
        reason: String,
    },
    /// A dialog subtree could not be built or attached.
    RenderFailure(String),
    /// An operation arrived before `initialize` succeeded.
    NotInitialized(&'static str),
}

impl std::fmt::Display for ManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTriggerId(id) => write!(f, "invalid trigger id {id:?}"),
            Self::DocumentUnavailable(what) => {
                write!(f, "document landmark unavailable: {what}")
            }
            Self::SetupFailure { stage, reason } => {
                write!(f, "setup stage '{stage}' failed: {reason}")
            }
            Self::RenderFailure(what) => write!(f, "dialog render failed: {what}"),
            Self::NotInitialized(op) => {
                write!(f, "operation '{op}' before initialization")
            }
        }
    }
}

impl std::error::Error for ManagerError {}

/// Log an error at the severity its class warrants.
///
/// Missing landmarks and render failures lose user-visible work and log
/// at `error`; the rest describe degraded-but-working paths.
pub(crate) fn report(err: &ManagerError) {
    match err {
        ManagerError::DocumentUnavailable(_) | ManagerError::RenderFailure(_) => {
            error!(target: "veil", %err);
        }
        _ => warn!(target: "veil", %err),
    }
}
