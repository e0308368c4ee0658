//! Vendor client interface
//!
//! The HTD client library owns the serial/TCP protocol, the connection and
//! the zone cache. The integration only sees it through [`HtdClient`].

use crate::error::HtdResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Highest raw volume the amplifier accepts
pub const MAX_VOLUME: u8 = 60;

/// Push notification from the client; carries the zone that changed, with
/// `None` or `Some(0)` meaning every zone may have changed
pub type ZoneCallback = Arc<dyn Fn(Option<u8>) + Send + Sync>;

/// Handle returned by [`HtdClient::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Amplifier model description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtdModel {
    pub name: String,
    /// Number of zones, numbered from 1
    pub zones: u8,
    /// Number of sources, numbered from 1
    pub sources: u8,
}

impl HtdModel {
    pub fn new(name: impl Into<String>, zones: u8, sources: u8) -> Self {
        Self {
            name: name.into(),
            zones,
            sources,
        }
    }

    /// MCA-66: six zones, six sources
    pub fn mca66() -> Self {
        Self::new("MCA-66", 6, 6)
    }
}

/// Status of one zone as last reported by the amplifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDetail {
    pub number: u8,
    pub enabled: bool,
    pub power: bool,
    pub mute: bool,
    /// Raw volume, `0..=MAX_VOLUME`
    pub volume: u8,
    /// Selected source id, numbered from 1
    pub source: u8,
}

impl ZoneDetail {
    /// An enabled zone that is off, silent and on source 1
    pub fn new(number: u8) -> Self {
        Self {
            number,
            enabled: true,
            power: false,
            mute: false,
            volume: 0,
            source: 1,
        }
    }
}

/// Connection to one HTD amplifier
///
/// Reads return the client's cached view and never block on the device.
/// Commands resolve once the request was sent; the resulting zone status
/// arrives later through the subscribed [`ZoneCallback`]s.
#[async_trait]
pub trait HtdClient: Send + Sync {
    fn model(&self) -> &HtdModel;

    fn zone_count(&self) -> u8 {
        self.model().zones
    }

    fn source_count(&self) -> u8 {
        self.model().sources
    }

    /// Transport is up
    fn is_connected(&self) -> bool;

    /// Connected and the initial zone status has been received
    fn is_ready(&self) -> bool;

    /// Cached status of a zone
    fn zone(&self, zone: u8) -> Option<ZoneDetail>;

    /// Ask the amplifier to resend the status of every zone
    fn refresh(&self);

    async fn power_on(&self, zone: u8) -> HtdResult<()>;

    async fn power_off(&self, zone: u8) -> HtdResult<()>;

    async fn volume_up(&self, zone: u8) -> HtdResult<()>;

    async fn volume_down(&self, zone: u8) -> HtdResult<()>;

    /// Set the raw volume, `0..=MAX_VOLUME`
    async fn set_volume(&self, zone: u8, volume: u8) -> HtdResult<()>;

    async fn mute(&self, zone: u8) -> HtdResult<()>;

    async fn unmute(&self, zone: u8) -> HtdResult<()>;

    async fn set_source(&self, zone: u8, source: u8) -> HtdResult<()>;

    /// Register a push callback
    async fn subscribe(&self, callback: ZoneCallback) -> SubscriptionId;

    /// Drop a push callback; unknown ids are ignored
    async fn unsubscribe(&self, id: SubscriptionId);
}
