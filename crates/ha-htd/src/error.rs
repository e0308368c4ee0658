//! Error types for the HTD integration

use ha_components::MediaPlayerError;
use ha_config_entries::InvalidTransition;
use ha_core::EntityIdError;
use thiserror::Error;

pub type HtdResult<T> = Result<T, HtdError>;

#[derive(Debug, Error)]
pub enum HtdError {
    /// The amplifier connection is down
    #[error("HTD client is not connected")]
    NotConnected,

    /// The client reported a failure it has no better variant for
    #[error("HTD client error: {0}")]
    Client(String),

    #[error("zone {0} does not exist on this device")]
    InvalidZone(u8),

    #[error("unknown source '{0}'")]
    UnknownSource(String),

    #[error("volume level {0} is outside 0..1")]
    InvalidVolume(f64),

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    EntityId(#[from] EntityIdError),

    #[error(transparent)]
    Lifecycle(#[from] InvalidTransition),
}

impl From<HtdError> for MediaPlayerError {
    fn from(err: HtdError) -> Self {
        match err {
            HtdError::UnknownSource(_) | HtdError::InvalidVolume(_) => {
                MediaPlayerError::InvalidData(err.to_string())
            }
            other => MediaPlayerError::Command(other.to_string()),
        }
    }
}
