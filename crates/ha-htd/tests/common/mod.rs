//! In-memory HTD client and host fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use ha_components::{EntityPlatform, MediaPlayerPlatform};
use ha_event_bus::EventBus;
use ha_htd::{
    HtdClient, HtdError, HtdModel, HtdResult, SubscriptionId, ZoneCallback, ZoneDetail, MAX_VOLUME,
};
use ha_state_machine::StateMachine;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Client whose commands apply immediately and notify subscribers
pub struct FakeHtdClient {
    model: HtdModel,
    connected: AtomicBool,
    ready: AtomicBool,
    zones: Mutex<BTreeMap<u8, ZoneDetail>>,
    subscribers: Mutex<BTreeMap<SubscriptionId, ZoneCallback>>,
    next_id: AtomicU64,
    commands: Mutex<Vec<String>>,
}

impl FakeHtdClient {
    pub fn new(model: HtdModel) -> Arc<Self> {
        let zones = (1..=model.zones)
            .map(|zone| (zone, ZoneDetail::new(zone)))
            .collect();
        Arc::new(Self {
            model,
            connected: AtomicBool::new(true),
            ready: AtomicBool::new(true),
            zones: Mutex::new(zones),
            subscribers: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            commands: Mutex::new(Vec::new()),
        })
    }

    pub fn mca66() -> Arc<Self> {
        Self::new(HtdModel::mca66())
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        self.ready.store(connected, Ordering::SeqCst);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Change a zone without notifying anyone
    pub fn edit_zone(&self, zone: u8, edit: impl FnOnce(&mut ZoneDetail)) {
        if let Some(detail) = self.zones.lock().unwrap().get_mut(&zone) {
            edit(detail);
        }
    }

    pub fn remove_zone(&self, zone: u8) {
        self.zones.lock().unwrap().remove(&zone);
    }

    /// Replace a zone's detail as-is, even with a mismatched number
    pub fn replace_zone(&self, zone: u8, detail: ZoneDetail) {
        self.zones.lock().unwrap().insert(zone, detail);
    }

    /// Deliver a push notification to every subscriber
    pub fn push(&self, zone: Option<u8>) {
        let callbacks: Vec<ZoneCallback> =
            self.subscribers.lock().unwrap().values().cloned().collect();
        for callback in callbacks {
            callback(zone);
        }
    }

    fn command(&self, zone: u8, name: String, edit: impl FnOnce(&mut ZoneDetail)) -> HtdResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(HtdError::NotConnected);
        }
        {
            let mut zones = self.zones.lock().unwrap();
            let detail = zones.get_mut(&zone).ok_or(HtdError::InvalidZone(zone))?;
            edit(detail);
        }
        self.commands.lock().unwrap().push(name);
        self.push(Some(zone));
        Ok(())
    }
}

#[async_trait]
impl HtdClient for FakeHtdClient {
    fn model(&self) -> &HtdModel {
        &self.model
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn zone(&self, zone: u8) -> Option<ZoneDetail> {
        self.zones.lock().unwrap().get(&zone).cloned()
    }

    fn refresh(&self) {
        self.push(None);
    }

    async fn power_on(&self, zone: u8) -> HtdResult<()> {
        self.command(zone, format!("power_on {}", zone), |d| d.power = true)
    }

    async fn power_off(&self, zone: u8) -> HtdResult<()> {
        self.command(zone, format!("power_off {}", zone), |d| d.power = false)
    }

    async fn volume_up(&self, zone: u8) -> HtdResult<()> {
        self.command(zone, format!("volume_up {}", zone), |d| {
            d.volume = (d.volume + 1).min(MAX_VOLUME)
        })
    }

    async fn volume_down(&self, zone: u8) -> HtdResult<()> {
        self.command(zone, format!("volume_down {}", zone), |d| {
            d.volume = d.volume.saturating_sub(1)
        })
    }

    async fn set_volume(&self, zone: u8, volume: u8) -> HtdResult<()> {
        self.command(zone, format!("set_volume {} {}", zone, volume), |d| {
            d.volume = volume
        })
    }

    async fn mute(&self, zone: u8) -> HtdResult<()> {
        self.command(zone, format!("mute {}", zone), |d| d.mute = true)
    }

    async fn unmute(&self, zone: u8) -> HtdResult<()> {
        self.command(zone, format!("unmute {}", zone), |d| d.mute = false)
    }

    async fn set_source(&self, zone: u8, source: u8) -> HtdResult<()> {
        self.command(zone, format!("set_source {} {}", zone, source), |d| {
            d.source = source
        })
    }

    async fn subscribe(&self, callback: ZoneCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscribers.lock().unwrap().insert(id, callback);
        id
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().unwrap().remove(&id);
    }
}

pub fn state_machine() -> Arc<StateMachine> {
    Arc::new(StateMachine::new(Arc::new(EventBus::new())))
}

pub fn legacy_platform(states: Arc<StateMachine>) -> MediaPlayerPlatform {
    EntityPlatform::new("media_player", "htd", states)
}
