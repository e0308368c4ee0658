//! Config entry lifecycle transitions
//!
//! ```text
//! NotLoaded → SetupInProgress → Loaded
//!                            ↘ SetupError → SetupInProgress (retry)
//!                            ↘ SetupRetry → SetupInProgress (auto-retry)
//!
//! Loaded/SetupError/SetupRetry → UnloadInProgress → NotLoaded
//!                                                 ↘ FailedUnload (terminal)
//! ```

use crate::entry::ConfigEntryState;
use thiserror::Error;

/// A lifecycle transition that the rules above do not allow
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid state transition from {from:?} to {to:?}: {reason}")]
pub struct InvalidTransition {
    pub from: ConfigEntryState,
    pub to: ConfigEntryState,
    pub reason: &'static str,
}

impl ConfigEntryState {
    /// Validate a transition, returning the target state
    pub fn try_transition(
        self,
        to: ConfigEntryState,
    ) -> Result<ConfigEntryState, InvalidTransition> {
        use ConfigEntryState::*;

        let valid = matches!(
            (self, to),
            (NotLoaded, SetupInProgress)
                | (SetupInProgress, Loaded | SetupError | SetupRetry)
                | (SetupError | SetupRetry, SetupInProgress | UnloadInProgress)
                | (Loaded, UnloadInProgress)
                | (UnloadInProgress, NotLoaded | FailedUnload)
        );

        if valid {
            return Ok(to);
        }

        let reason = match (self, to) {
            (FailedUnload, _) => "FailedUnload is terminal - entry cannot recover",
            (NotLoaded, _) => "Setup must start with SetupInProgress",
            (Loaded, SetupInProgress) => "Already loaded - unload first before re-setup",
            (Loaded, _) => "Loaded entries must go through UnloadInProgress",
            (UnloadInProgress, _) => "Unload in progress - must finish first",
            _ => "Invalid state transition",
        };
        Err(InvalidTransition {
            from: self,
            to,
            reason,
        })
    }

    pub fn can_transition_to(self, to: ConfigEntryState) -> bool {
        self.try_transition(to).is_ok()
    }
}
