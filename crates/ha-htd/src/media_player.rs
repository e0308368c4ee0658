//! Zone entity adapter
//!
//! Every amplifier zone is exposed as one [`HtdDevice`] media player. The
//! adapter keeps the last [`ZoneDetail`] it received and translates entity
//! commands into client calls. State changes arrive through the client's
//! push callback; the adapter never polls.

use crate::client::{HtdClient, SubscriptionId, ZoneCallback, ZoneDetail, MAX_VOLUME};
use crate::consts::ICON;
use crate::entity_id::{media_player_entity_id, zone_unique_id, zone_width};
use crate::error::{HtdError, HtdResult};
use crate::mapping::FriendlyNames;
use async_trait::async_trait;
use ha_components::media_player::{capability_attributes, state_attributes};
use ha_components::{
    Entity, MediaPlayerEntity, MediaPlayerEntityFeature, MediaPlayerError, MediaPlayerState,
    StateWriter,
};
use ha_core::{EntityId, STATE_UNAVAILABLE};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// Everything an HTD zone can do
pub const SUPPORT_HTD: MediaPlayerEntityFeature = MediaPlayerEntityFeature::SELECT_SOURCE
    .union(MediaPlayerEntityFeature::TURN_OFF)
    .union(MediaPlayerEntityFeature::TURN_ON)
    .union(MediaPlayerEntityFeature::VOLUME_MUTE)
    .union(MediaPlayerEntityFeature::VOLUME_SET)
    .union(MediaPlayerEntityFeature::VOLUME_STEP);

/// Convert a `0.0..=1.0` volume level to the amplifier's raw scale
///
/// The raw value is truncated, so 0.5 becomes 30.
pub fn volume_to_raw(level: f64) -> HtdResult<u8> {
    if !level.is_finite() || !(0.0..=1.0).contains(&level) {
        return Err(HtdError::InvalidVolume(level));
    }
    Ok((level * f64::from(MAX_VOLUME)) as u8)
}

pub fn raw_to_volume(raw: u8) -> f64 {
    f64::from(raw) / f64::from(MAX_VOLUME)
}

/// One amplifier zone as a media player
pub struct HtdDevice {
    unique_id: String,
    device_name: String,
    zone: u8,
    entity_id: EntityId,
    client: Arc<dyn HtdClient>,
    names: Arc<FriendlyNames>,
    /// Last snapshot; replaced whole, never patched
    zone_info: RwLock<Option<ZoneDetail>>,
    subscription: Mutex<Option<SubscriptionId>>,
    this: Weak<HtdDevice>,
}

impl HtdDevice {
    pub fn new(
        device_unique_id: &str,
        device_name: &str,
        zone: u8,
        client: Arc<dyn HtdClient>,
        names: Arc<FriendlyNames>,
    ) -> HtdResult<Arc<Self>> {
        if zone == 0 || zone > client.zone_count() {
            return Err(HtdError::InvalidZone(zone));
        }
        let width = zone_width(client.model().zones);
        let entity_id = media_player_entity_id(device_name, zone, width)?;

        Ok(Arc::new_cyclic(|this| Self {
            unique_id: zone_unique_id(device_unique_id, zone),
            device_name: device_name.to_string(),
            zone,
            entity_id,
            client,
            names,
            zone_info: RwLock::new(None),
            subscription: Mutex::new(None),
            this: this.clone(),
        }))
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Last snapshot received from the client
    pub fn zone_info(&self) -> Option<ZoneDetail> {
        self.zone_info
            .read()
            .map(|info| info.clone())
            .unwrap_or_default()
    }

    fn set_zone_info(&self, info: Option<ZoneDetail>) {
        *self
            .zone_info
            .write()
            .unwrap_or_else(PoisonError::into_inner) = info;
    }

    pub async fn is_subscribed(&self) -> bool {
        self.subscription.lock().await.is_some()
    }

    /// React to a push notification for `zone`
    ///
    /// Notifications for other zones are ignored, as are snapshots the
    /// client cannot provide or that belong to another zone. Returns whether
    /// the snapshot was replaced and the state written.
    pub fn handle_push(&self, zone: Option<u8>, writer: &StateWriter) -> bool {
        if let Some(zone) = zone {
            if zone != 0 && zone != self.zone {
                trace!(zone = self.zone, "Ignoring update for zone {}", zone);
                return false;
            }
        }

        let Some(detail) = self.client.zone(self.zone) else {
            debug!(zone = self.zone, "No zone detail available yet");
            return false;
        };
        if detail.number != self.zone {
            warn!(
                zone = self.zone,
                "Client returned detail for zone {}, ignoring", detail.number
            );
            return false;
        }

        self.set_zone_info(Some(detail));
        writer.write(self);
        true
    }
}

#[async_trait]
impl Entity for HtdDevice {
    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    fn unique_id(&self) -> Option<&str> {
        Some(&self.unique_id)
    }

    /// Friendly zone name; `None` for zones named "Unused"
    fn name(&self) -> Option<String> {
        self.names.zone_name(self.zone, &self.device_name)
    }

    fn icon(&self) -> Option<&str> {
        Some(ICON)
    }

    fn should_poll(&self) -> bool {
        false
    }

    fn available(&self) -> bool {
        self.client.is_ready() && self.zone_info().is_some()
    }

    /// Disabled until the first snapshot arrives
    fn enabled(&self) -> bool {
        self.zone_info().is_some_and(|info| info.enabled)
    }

    fn state(&self) -> Option<String> {
        if !self.client.is_connected() {
            return Some(STATE_UNAVAILABLE.to_string());
        }
        self.player_state().map(|state| state.to_string())
    }

    fn capability_attributes(&self) -> HashMap<String, Value> {
        capability_attributes(self)
    }

    fn state_attributes(&self) -> HashMap<String, Value> {
        state_attributes(self)
    }

    async fn update(&self) {
        self.set_zone_info(self.client.zone(self.zone));
    }

    async fn added_to_hass(&self, writer: StateWriter) {
        let mut subscription = self.subscription.lock().await;
        if let Some(id) = *subscription {
            debug!(entity_id = %self.entity_id, "Already subscribed as {}", id);
            return;
        }

        let this = self.this.clone();
        let callback: ZoneCallback = Arc::new(move |zone| {
            if let Some(device) = this.upgrade() {
                device.handle_push(zone, &writer);
            }
        });
        let id = self.client.subscribe(callback).await;
        *subscription = Some(id);
        drop(subscription);

        debug!(entity_id = %self.entity_id, "Subscribed to zone {} as {}", self.zone, id);
        self.client.refresh();
    }

    async fn will_remove_from_hass(&self) {
        let Some(id) = self.subscription.lock().await.take() else {
            return;
        };
        self.client.unsubscribe(id).await;
        debug!(entity_id = %self.entity_id, "Unsubscribed {}", id);
    }
}

#[async_trait]
impl MediaPlayerEntity for HtdDevice {
    fn supported_features(&self) -> MediaPlayerEntityFeature {
        SUPPORT_HTD
    }

    fn player_state(&self) -> Option<MediaPlayerState> {
        self.zone_info().map(|info| {
            if info.power {
                MediaPlayerState::On
            } else {
                MediaPlayerState::Off
            }
        })
    }

    fn volume_level(&self) -> Option<f64> {
        self.zone_info().map(|info| raw_to_volume(info.volume))
    }

    fn volume_step(&self) -> f64 {
        1.0 / f64::from(MAX_VOLUME)
    }

    fn is_volume_muted(&self) -> Option<bool> {
        self.zone_info().map(|info| info.mute)
    }

    fn source(&self) -> Option<String> {
        self.zone_info()
            .and_then(|info| self.names.source_name(info.source))
    }

    fn source_list(&self) -> Option<Vec<String>> {
        Some(self.names.source_list(self.client.source_count()))
    }

    fn media_title(&self) -> Option<String> {
        self.source()
    }

    async fn turn_on(&self) -> Result<(), MediaPlayerError> {
        Ok(self.client.power_on(self.zone).await?)
    }

    async fn turn_off(&self) -> Result<(), MediaPlayerError> {
        Ok(self.client.power_off(self.zone).await?)
    }

    async fn set_volume_level(&self, volume: f64) -> Result<(), MediaPlayerError> {
        let raw = volume_to_raw(volume)?;
        info!(
            "Setting volume for zone {} to {}, raw htd = {}",
            self.zone, volume, raw
        );
        Ok(self.client.set_volume(self.zone, raw).await?)
    }

    async fn volume_up(&self) -> Result<(), MediaPlayerError> {
        Ok(self.client.volume_up(self.zone).await?)
    }

    async fn volume_down(&self) -> Result<(), MediaPlayerError> {
        Ok(self.client.volume_down(self.zone).await?)
    }

    async fn mute_volume(&self, mute: bool) -> Result<(), MediaPlayerError> {
        if mute {
            Ok(self.client.mute(self.zone).await?)
        } else {
            Ok(self.client.unmute(self.zone).await?)
        }
    }

    async fn select_source(&self, source: &str) -> Result<(), MediaPlayerError> {
        let source_id = self
            .names
            .source_id(source, self.client.source_count())
            .ok_or_else(|| HtdError::UnknownSource(source.to_string()))?;
        Ok(self.client.set_source(self.zone, source_id).await?)
    }
}
