//! Constants for the HTD integration

/// Integration domain
pub const DOMAIN: &str = "htd";

/// Config entry data key holding the device's unique id
pub const CONF_UNIQUE_ID: &str = "unique_id";

/// Legacy platform key holding the device name
pub const CONF_DEVICE_NAME: &str = "device_name";

/// Option key holding zone friendly names
pub const CONF_ZONES: &str = "zones";

/// Option key holding source friendly names
pub const CONF_SOURCES: &str = "sources";

/// Icon shown for every zone
pub const ICON: &str = "mdi:disc-player";

/// Zones up to this number get a plain "Zone k" default name
pub const GENERIC_ZONE_NAME_LIMIT: u8 = 12;

/// Friendly name that hides a zone or source
pub const UNUSED_NAME: &str = "unused";
