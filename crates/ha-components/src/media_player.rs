//! Media Player Component
//!
//! Entity contract, feature flags and service handling for the
//! `media_player` domain.

use crate::entity::{Entity, EntityPlatform};
use async_trait::async_trait;
use ha_core::ServiceCall;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DOMAIN: &str = "media_player";

pub const ATTR_SUPPORTED_FEATURES: &str = "supported_features";
pub const ATTR_SOURCE_LIST: &str = "source_list";
pub const ATTR_INPUT_SOURCE: &str = "source";
pub const ATTR_MEDIA_VOLUME_LEVEL: &str = "volume_level";
pub const ATTR_MEDIA_VOLUME_MUTED: &str = "is_volume_muted";
pub const ATTR_MEDIA_TITLE: &str = "media_title";

/// Step used by the default volume up/down implementation
pub const DEFAULT_VOLUME_STEP: f64 = 0.1;

/// Platform type for media players of any integration
pub type MediaPlayerPlatform = EntityPlatform<dyn MediaPlayerEntity>;

/// Errors raised by media player commands and service calls
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MediaPlayerError {
    #[error("entity {entity_id} does not support {service}")]
    NotSupported {
        entity_id: String,
        service: &'static str,
    },

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("unknown media_player service: {0}")]
    UnknownService(String),

    #[error("invalid service data: {0}")]
    InvalidData(String),

    #[error("command failed: {0}")]
    Command(String),
}

/// Feature bit set, numerically identical to Home Assistant's
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaPlayerEntityFeature(u32);

impl MediaPlayerEntityFeature {
    pub const PAUSE: Self = Self(1);
    pub const SEEK: Self = Self(2);
    pub const VOLUME_SET: Self = Self(4);
    pub const VOLUME_MUTE: Self = Self(8);
    pub const PREVIOUS_TRACK: Self = Self(16);
    pub const NEXT_TRACK: Self = Self(32);
    pub const TURN_ON: Self = Self(128);
    pub const TURN_OFF: Self = Self(256);
    pub const PLAY_MEDIA: Self = Self(512);
    pub const VOLUME_STEP: Self = Self(1024);
    pub const SELECT_SOURCE: Self = Self(2048);
    pub const STOP: Self = Self(4096);
    pub const CLEAR_PLAYLIST: Self = Self(8192);
    pub const PLAY: Self = Self(16384);
    pub const SHUFFLE_SET: Self = Self(32768);
    pub const SELECT_SOUND_MODE: Self = Self(65536);
    pub const BROWSE_MEDIA: Self = Self(131072);
    pub const REPEAT_SET: Self = Self(262144);
    pub const GROUPING: Self = Self(524288);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// `self | other`, usable in constants
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// All bits of `other` are set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any bit of `other` is set
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for MediaPlayerEntityFeature {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for MediaPlayerEntityFeature {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Player state values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaPlayerState {
    Off,
    On,
    Idle,
    Playing,
    Paused,
    Standby,
    Buffering,
}

impl MediaPlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaPlayerState::Off => "off",
            MediaPlayerState::On => "on",
            MediaPlayerState::Idle => "idle",
            MediaPlayerState::Playing => "playing",
            MediaPlayerState::Paused => "paused",
            MediaPlayerState::Standby => "standby",
            MediaPlayerState::Buffering => "buffering",
        }
    }
}

impl fmt::Display for MediaPlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn not_supported<E: Entity + ?Sized>(entity: &E, service: &'static str) -> MediaPlayerError {
    MediaPlayerError::NotSupported {
        entity_id: entity.entity_id().to_string(),
        service,
    }
}

/// A media player entity
///
/// Commands default to [`MediaPlayerError::NotSupported`]; implementors
/// override the ones matching their [`supported_features`].
///
/// [`supported_features`]: MediaPlayerEntity::supported_features
#[async_trait]
pub trait MediaPlayerEntity: Entity {
    fn supported_features(&self) -> MediaPlayerEntityFeature;

    /// `None` when the player state is not known yet
    fn player_state(&self) -> Option<MediaPlayerState>;

    /// Volume in `0.0..=1.0`
    fn volume_level(&self) -> Option<f64> {
        None
    }

    fn volume_step(&self) -> f64 {
        DEFAULT_VOLUME_STEP
    }

    fn is_volume_muted(&self) -> Option<bool> {
        None
    }

    /// Name of the selected input source
    fn source(&self) -> Option<String> {
        None
    }

    /// Names of the selectable input sources
    fn source_list(&self) -> Option<Vec<String>> {
        None
    }

    fn media_title(&self) -> Option<String> {
        None
    }

    async fn turn_on(&self) -> Result<(), MediaPlayerError> {
        Err(not_supported(self, "turn_on"))
    }

    async fn turn_off(&self) -> Result<(), MediaPlayerError> {
        Err(not_supported(self, "turn_off"))
    }

    async fn set_volume_level(&self, _volume: f64) -> Result<(), MediaPlayerError> {
        Err(not_supported(self, "volume_set"))
    }

    /// Defaults to stepping [`volume_level`](MediaPlayerEntity::volume_level) up
    async fn volume_up(&self) -> Result<(), MediaPlayerError> {
        match self.volume_level() {
            Some(level)
                if self
                    .supported_features()
                    .contains(MediaPlayerEntityFeature::VOLUME_SET) =>
            {
                self.set_volume_level((level + self.volume_step()).min(1.0))
                    .await
            }
            _ => Err(not_supported(self, "volume_up")),
        }
    }

    /// Defaults to stepping [`volume_level`](MediaPlayerEntity::volume_level) down
    async fn volume_down(&self) -> Result<(), MediaPlayerError> {
        match self.volume_level() {
            Some(level)
                if self
                    .supported_features()
                    .contains(MediaPlayerEntityFeature::VOLUME_SET) =>
            {
                self.set_volume_level((level - self.volume_step()).max(0.0))
                    .await
            }
            _ => Err(not_supported(self, "volume_down")),
        }
    }

    async fn mute_volume(&self, _mute: bool) -> Result<(), MediaPlayerError> {
        Err(not_supported(self, "volume_mute"))
    }

    async fn select_source(&self, _source: &str) -> Result<(), MediaPlayerError> {
        Err(not_supported(self, "select_source"))
    }
}

/// Attributes that describe what the player can do
pub fn capability_attributes<E: MediaPlayerEntity + ?Sized>(
    entity: &E,
) -> HashMap<String, Value> {
    let mut attributes = HashMap::from([(
        ATTR_SUPPORTED_FEATURES.to_string(),
        json!(entity.supported_features().bits()),
    )]);
    if let Some(sources) = entity.source_list() {
        attributes.insert(ATTR_SOURCE_LIST.to_string(), json!(sources));
    }
    attributes
}

/// Attributes that describe what the player is doing; empty while off
pub fn state_attributes<E: MediaPlayerEntity + ?Sized>(entity: &E) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    if entity.player_state() == Some(MediaPlayerState::Off) {
        return attributes;
    }

    if let Some(level) = entity.volume_level() {
        attributes.insert(ATTR_MEDIA_VOLUME_LEVEL.to_string(), json!(level));
    }
    if let Some(muted) = entity.is_volume_muted() {
        attributes.insert(ATTR_MEDIA_VOLUME_MUTED.to_string(), json!(muted));
    }
    if let Some(source) = entity.source() {
        attributes.insert(ATTR_INPUT_SOURCE.to_string(), json!(source));
    }
    if let Some(title) = entity.media_title() {
        attributes.insert(ATTR_MEDIA_TITLE.to_string(), json!(title));
    }
    attributes
}

/// Services of the media_player domain handled here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    TurnOn,
    TurnOff,
    Toggle,
    VolumeUp,
    VolumeDown,
    VolumeSet,
    VolumeMute,
    SelectSource,
}

impl Service {
    fn parse(name: &str) -> Result<Self, MediaPlayerError> {
        Ok(match name {
            "turn_on" => Service::TurnOn,
            "turn_off" => Service::TurnOff,
            "toggle" => Service::Toggle,
            "volume_up" => Service::VolumeUp,
            "volume_down" => Service::VolumeDown,
            "volume_set" => Service::VolumeSet,
            "volume_mute" => Service::VolumeMute,
            "select_source" => Service::SelectSource,
            other => return Err(MediaPlayerError::UnknownService(other.to_string())),
        })
    }

    fn name(self) -> &'static str {
        match self {
            Service::TurnOn => "turn_on",
            Service::TurnOff => "turn_off",
            Service::Toggle => "toggle",
            Service::VolumeUp => "volume_up",
            Service::VolumeDown => "volume_down",
            Service::VolumeSet => "volume_set",
            Service::VolumeMute => "volume_mute",
            Service::SelectSource => "select_source",
        }
    }

    /// Features of which at least one must be supported
    fn required_features(self) -> MediaPlayerEntityFeature {
        use MediaPlayerEntityFeature as F;
        match self {
            Service::TurnOn => F::TURN_ON,
            Service::TurnOff => F::TURN_OFF,
            Service::Toggle => F::TURN_ON | F::TURN_OFF,
            Service::VolumeUp | Service::VolumeDown => F::VOLUME_SET | F::VOLUME_STEP,
            Service::VolumeSet => F::VOLUME_SET,
            Service::VolumeMute => F::VOLUME_MUTE,
            Service::SelectSource => F::SELECT_SOURCE,
        }
    }
}

/// Parsed and validated service data
enum Command {
    None,
    Volume(f64),
    Mute(bool),
    Source(String),
}

fn parse_command(service: Service, call: &ServiceCall) -> Result<Command, MediaPlayerError> {
    match service {
        Service::VolumeSet => {
            let level = call
                .get::<f64>(ATTR_MEDIA_VOLUME_LEVEL)
                .ok_or_else(|| MediaPlayerError::InvalidData("volume_level is required".into()))?;
            if !(0.0..=1.0).contains(&level) {
                return Err(MediaPlayerError::InvalidData(format!(
                    "volume_level {} is outside 0..1",
                    level
                )));
            }
            Ok(Command::Volume(level))
        }
        Service::VolumeMute => call
            .get::<bool>(ATTR_MEDIA_VOLUME_MUTED)
            .map(Command::Mute)
            .ok_or_else(|| MediaPlayerError::InvalidData("is_volume_muted is required".into())),
        Service::SelectSource => call
            .get::<String>(ATTR_INPUT_SOURCE)
            .map(Command::Source)
            .ok_or_else(|| MediaPlayerError::InvalidData("source is required".into())),
        _ => Ok(Command::None),
    }
}

/// Resolve the targets of a call; `all` or no target selects every entity
fn target_entities(
    platform: &MediaPlayerPlatform,
    call: &ServiceCall,
) -> Result<Vec<Arc<dyn MediaPlayerEntity>>, MediaPlayerError> {
    let requested = call.entity_ids();
    if requested.is_empty() || requested.iter().any(|id| id == "all") {
        return Ok(platform
            .entity_ids()
            .iter()
            .filter_map(|id| platform.entity(id))
            .collect());
    }

    let mut targets = Vec::with_capacity(requested.len());
    for entity_id in &requested {
        match platform.entity(entity_id) {
            Some(entity) => targets.push(entity),
            None => warn!("Referenced entity {} not found", entity_id),
        }
    }
    if targets.is_empty() {
        return Err(MediaPlayerError::EntityNotFound(requested.join(", ")));
    }
    Ok(targets)
}

/// Handle a `media_player.*` service call against a platform
///
/// Returns the number of entities the call was applied to.
#[instrument(skip_all, fields(service = %call.service))]
pub async fn call_service(
    platform: &MediaPlayerPlatform,
    call: &ServiceCall,
) -> Result<usize, MediaPlayerError> {
    let service = Service::parse(&call.service)?;
    let command = parse_command(service, call)?;
    let targets = target_entities(platform, call)?;

    // Nothing is dispatched unless every target supports the service
    if let Some(entity) = targets.iter().find(|entity| {
        !entity
            .supported_features()
            .intersects(service.required_features())
    }) {
        return Err(not_supported(entity.as_ref(), service.name()));
    }

    for entity in &targets {
        debug!(entity_id = %entity.entity_id(), "Calling {}", service.name());
        match (service, &command) {
            (Service::TurnOn, _) => entity.turn_on().await?,
            (Service::TurnOff, _) => entity.turn_off().await?,
            (Service::Toggle, _) => match entity.player_state() {
                Some(MediaPlayerState::Off | MediaPlayerState::Standby) | None => {
                    entity.turn_on().await?
                }
                Some(_) => entity.turn_off().await?,
            },
            (Service::VolumeUp, _) => entity.volume_up().await?,
            (Service::VolumeDown, _) => entity.volume_down().await?,
            (Service::VolumeSet, Command::Volume(level)) => {
                entity.set_volume_level(*level).await?
            }
            (Service::VolumeMute, Command::Mute(mute)) => entity.mute_volume(*mute).await?,
            (Service::SelectSource, Command::Source(source)) => {
                entity.select_source(source).await?
            }
            _ => {
                return Err(MediaPlayerError::InvalidData(format!(
                    "missing data for {}",
                    service.name()
                )))
            }
        }

        if entity.should_poll() {
            entity.update().await;
            platform
                .writer()
                .write_with_context(entity.as_ref(), call.context.child());
        }
    }

    Ok(targets.len())
}
