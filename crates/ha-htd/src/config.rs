//! Device settings from config entries and legacy YAML
//!
//! Config entries carry the device name as their title, the device unique id
//! in `data` and friendly names in `options`. The legacy platform reads a
//! YAML list of devices instead:
//!
//! ```yaml
//! - unique_id: mca66-001
//!   device_name: Living Room Amp
//!   zones: "1=Kitchen,2=Patio"
//!   sources:
//!     1: Tuner
//!     6: Unused
//! ```

use crate::consts::{CONF_SOURCES, CONF_UNIQUE_ID, CONF_ZONES};
use crate::error::{HtdError, HtdResult};
use crate::mapping::{parse_mapping_value, FriendlyNames, NameMapConfig};
use ha_config_entries::ConfigEntry;
use serde::Deserialize;
use tracing::debug;

/// One device of the legacy platform configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HtdDeviceConfig {
    pub unique_id: String,
    pub device_name: String,
    #[serde(default)]
    pub zones: Option<NameMapConfig>,
    #[serde(default)]
    pub sources: Option<NameMapConfig>,
}

impl HtdDeviceConfig {
    pub fn validate(&self) -> HtdResult<()> {
        if self.unique_id.trim().is_empty() {
            return Err(HtdError::InvalidConfig {
                key: CONF_UNIQUE_ID.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn friendly_names(&self) -> FriendlyNames {
        FriendlyNames::new(
            self.zones.as_ref().map(NameMapConfig::to_map).unwrap_or_default(),
            self.sources
                .as_ref()
                .map(NameMapConfig::to_map)
                .unwrap_or_default(),
        )
    }
}

/// Parse and validate the legacy platform configuration
pub fn load_platform_config(yaml: &str) -> HtdResult<Vec<HtdDeviceConfig>> {
    let devices: Vec<HtdDeviceConfig> = serde_yaml::from_str(yaml)?;
    for device in &devices {
        device.validate()?;
    }
    debug!("Loaded {} HTD device(s) from YAML", devices.len());
    Ok(devices)
}

/// What setup needs to know about one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub unique_id: String,
    pub device_name: String,
    pub names: FriendlyNames,
}

impl DeviceSettings {
    /// Read settings from a config entry
    ///
    /// The unique id comes from `data`, else the entry's own unique id, else
    /// the entry id.
    pub fn from_entry(entry: &ConfigEntry) -> Self {
        let unique_id = entry
            .data_str(CONF_UNIQUE_ID)
            .or(entry.unique_id.as_deref())
            .unwrap_or(entry.entry_id.as_str())
            .to_string();

        Self {
            unique_id,
            device_name: entry.title.clone(),
            names: FriendlyNames::new(
                parse_mapping_value(entry.option(CONF_ZONES)),
                parse_mapping_value(entry.option(CONF_SOURCES)),
            ),
        }
    }
}

impl From<&HtdDeviceConfig> for DeviceSettings {
    fn from(config: &HtdDeviceConfig) -> Self {
        Self {
            unique_id: config.unique_id.clone(),
            device_name: config.device_name.clone(),
            names: config.friendly_names(),
        }
    }
}
