//! Entity Components
//!
//! The entity contract integrations implement, the platforms that host their
//! entities, and the built-in `media_player` component.

pub mod entity;
pub mod media_player;

pub use entity::{compose_state, Entity, EntityPlatform, StateWriter};
pub use media_player::{
    call_service, MediaPlayerEntity, MediaPlayerEntityFeature, MediaPlayerError,
    MediaPlayerPlatform, MediaPlayerState,
};
