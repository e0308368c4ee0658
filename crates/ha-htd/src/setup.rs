//! Entry and platform setup
//!
//! Config entries and the legacy YAML platform both end up here: one
//! [`HtdDevice`] per zone the client reports, added to a media player
//! platform.

use crate::client::HtdClient;
use crate::config::{DeviceSettings, HtdDeviceConfig};
use crate::consts::DOMAIN;
use crate::error::{HtdError, HtdResult};
use crate::media_player::HtdDevice;
use ha_components::media_player::DOMAIN as MEDIA_PLAYER_DOMAIN;
use ha_components::{EntityPlatform, MediaPlayerEntity, MediaPlayerPlatform};
use ha_config_entries::{ConfigEntry, ConfigEntryState};
use ha_state_machine::StateMachine;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Media player platform owned by one HTD config entry
pub fn create_platform(entry: &ConfigEntry, states: Arc<StateMachine>) -> MediaPlayerPlatform {
    EntityPlatform::new(MEDIA_PLAYER_DOMAIN, DOMAIN, states).for_config_entry(&entry.entry_id)
}

/// One adapter per zone `1..=zone_count`
pub fn build_zone_entities(
    settings: &DeviceSettings,
    client: Arc<dyn HtdClient>,
) -> HtdResult<Vec<Arc<HtdDevice>>> {
    let names = Arc::new(settings.names.clone());
    (1..=client.zone_count())
        .map(|zone| {
            HtdDevice::new(
                &settings.unique_id,
                &settings.device_name,
                zone,
                client.clone(),
                names.clone(),
            )
        })
        .collect()
}

fn as_media_players(devices: Vec<Arc<HtdDevice>>) -> Vec<Arc<dyn MediaPlayerEntity>> {
    devices
        .into_iter()
        .map(|device| device as Arc<dyn MediaPlayerEntity>)
        .collect()
}

/// Set up the zone entities of a config entry
///
/// Moves the entry to `Loaded`, or to `SetupError` with the failure as its
/// reason. Returns the number of entities added.
#[instrument(skip_all, fields(entry_id = %entry.entry_id))]
pub async fn async_setup_entry(
    entry: &mut ConfigEntry,
    client: Arc<dyn HtdClient>,
    platform: &MediaPlayerPlatform,
) -> HtdResult<usize> {
    entry.try_set_state(ConfigEntryState::SetupInProgress, None)?;

    let devices = match platform.config_entry_id() {
        Some(owner) if owner != entry.entry_id => Err(HtdError::InvalidConfig {
            key: "entry_id".to_string(),
            reason: format!("platform belongs to entry {}", owner),
        }),
        _ => build_zone_entities(&DeviceSettings::from_entry(entry), client),
    };

    match devices {
        Ok(devices) => {
            let added = platform.add_entities(as_media_players(devices), false).await;
            entry.try_set_state(ConfigEntryState::Loaded, None)?;
            info!("Set up HTD device {} with {} zone(s)", entry.title, added);
            Ok(added)
        }
        Err(err) => {
            warn!("Setting up HTD device {} failed: {}", entry.title, err);
            entry.try_set_state(ConfigEntryState::SetupError, Some(err.to_string()))?;
            Err(err)
        }
    }
}

/// Remove the entry's entities; each one unsubscribes from its client
#[instrument(skip_all, fields(entry_id = %entry.entry_id))]
pub async fn async_unload_entry(
    entry: &mut ConfigEntry,
    platform: &MediaPlayerPlatform,
) -> HtdResult<usize> {
    entry.try_set_state(ConfigEntryState::UnloadInProgress, None)?;
    let removed = platform.reset().await;
    entry.try_set_state(ConfigEntryState::NotLoaded, None)?;

    info!("Unloaded HTD device {} ({} entities)", entry.title, removed);
    Ok(removed)
}

/// Legacy YAML setup: every configured device with its client
///
/// Nothing is added unless every device builds.
pub async fn async_setup_platform(
    devices: Vec<(HtdDeviceConfig, Arc<dyn HtdClient>)>,
    platform: &MediaPlayerPlatform,
) -> HtdResult<usize> {
    let mut entities = Vec::new();
    for (config, client) in devices {
        config.validate()?;
        entities.extend(build_zone_entities(&DeviceSettings::from(&config), client)?);
    }
    Ok(platform.add_entities(as_media_players(entities), false).await)
}
