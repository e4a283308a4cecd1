//! Fetch phase state machine
//!
//! Every phase change an orchestrator makes goes through
//! [`validate_transition`]; the table in [`allowed_transitions`] is the only
//! source of truth.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of one listing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPhase {
    /// Nothing dispatched yet, or reset
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// Latest request committed a page
    Success,
    /// Latest request failed
    Error,
}

impl FetchPhase {
    /// Check if no request is in flight
    #[inline]
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Validate a phase change
///
/// # Errors
/// Returns `FetchError::IllegalTransition` if the table does not allow it.
pub fn validate_transition(from: FetchPhase, to: FetchPhase) -> Result<(), FetchError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(FetchError::IllegalTransition { from, to })
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: FetchPhase) -> &'static [FetchPhase] {
    use FetchPhase::{Error, Idle, Loading, Success};
    match from {
        Idle => &[Loading],
        // Loading -> Loading when a newer dispatch supersedes the current one.
        Loading => &[Loading, Success, Error, Idle],
        Success => &[Loading, Idle],
        Error => &[Loading, Idle],
    }
}
