//! Config Entries
//!
//! A config entry is one configured instance of an integration: its title,
//! immutable setup data, user options and lifecycle state.
//!
//! # Key Types
//!
//! - [`ConfigEntry`] - A single integration configuration
//! - [`ConfigEntryState`] - Lifecycle state of an entry
//! - [`InvalidTransition`] - Rejected lifecycle transition

pub mod entry;
pub mod state_machine;

pub use entry::{ConfigEntry, ConfigEntryState};
pub use state_machine::InvalidTransition;
