//! HTD Integration
//!
//! Exposes every zone of an HTD multi-zone amplifier (MCA-66, Lync) as a
//! `media_player` entity. The amplifier protocol lives behind [`HtdClient`];
//! this crate maps zones and sources to entities and friendly names.
//!
//! ```text
//! ConfigEntry ──> async_setup_entry ──> HtdDevice (zone 1..N) ──> MediaPlayerPlatform
//!                                            │        ▲
//!                                   commands │        │ push callback
//!                                            ▼        │
//!                                           dyn HtdClient
//! ```

pub mod client;
pub mod config;
pub mod consts;
pub mod entity_id;
pub mod error;
pub mod mapping;
pub mod media_player;
pub mod setup;

pub use client::{HtdClient, HtdModel, SubscriptionId, ZoneCallback, ZoneDetail, MAX_VOLUME};
pub use config::{load_platform_config, DeviceSettings, HtdDeviceConfig};
pub use consts::DOMAIN;
pub use error::{HtdError, HtdResult};
pub use mapping::{parse_mapping, parse_mapping_value, FriendlyNames, NameMap, NameMapConfig};
pub use media_player::{HtdDevice, SUPPORT_HTD};
pub use setup::{
    async_setup_entry, async_setup_platform, async_unload_entry, build_zone_entities,
    create_platform,
};
