//! Core types for the automation host
//!
//! The value types every other crate in the workspace speaks: EntityId,
//! State, Event, Context and ServiceCall, plus the well-known state strings.

mod context;
mod entity_id;
mod event;
mod service_call;
mod state;

pub use context::Context;
pub use entity_id::{EntityId, EntityIdError};
pub use event::{Event, EventData, EventOrigin, EventType};
pub use service_call::ServiceCall;
pub use state::State;

/// Entity is switched on
pub const STATE_ON: &str = "on";

/// Entity is switched off
pub const STATE_OFF: &str = "off";

/// Entity exists but its state could not be determined
pub const STATE_UNKNOWN: &str = "unknown";

/// Entity cannot be reached
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Attribute carrying the display name of an entity
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";

/// Attribute carrying the icon of an entity
pub const ATTR_ICON: &str = "icon";

/// Attribute carrying entity targets in service data
pub const ATTR_ENTITY_ID: &str = "entity_id";

/// Standard event types
pub mod events {
    use super::*;

    /// Fired whenever an entity state is written or removed
    pub const STATE_CHANGED: &str = "state_changed";

    /// Data for STATE_CHANGED events
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    pub struct StateChangedData {
        pub entity_id: EntityId,
        pub old_state: Option<State>,
        pub new_state: Option<State>,
    }

    impl EventData for StateChangedData {
        fn event_type() -> &'static str {
            STATE_CHANGED
        }
    }
}
