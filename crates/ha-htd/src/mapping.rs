//! Friendly names for zones and sources
//!
//! Users name zones and sources through options written either as JSON
//! (`{"1": "Kitchen"}`) or as comma separated pairs (`1=Kitchen,2=Patio`).
//! A name of "Unused" hides the zone or source.

use crate::consts::{GENERIC_ZONE_NAME_LIMIT, UNUSED_NAME};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Id -> friendly name
pub type NameMap = BTreeMap<u8, String>;

/// Parse a mapping option string
///
/// JSON objects with integer keys are taken as-is; anything else is read as
/// `k=v` pairs, skipping pairs without `=` or with a non-integer key.
pub fn parse_mapping(text: &str) -> NameMap {
    if text.trim().is_empty() {
        return NameMap::new();
    }

    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) {
        if let Some(map) = map_from_json(&object) {
            return map;
        }
        debug!("JSON mapping has non-integer keys, reading as k=v pairs");
    }

    let mut map = NameMap::new();
    for item in text.split(',') {
        let Some((key, value)) = item.split_once('=') else {
            continue;
        };
        match parse_id(key) {
            Some(id) => {
                map.insert(id, value.trim().to_string());
            }
            None => debug!("Skipping mapping item with invalid id '{}'", key.trim()),
        }
    }
    map
}

/// Parse a mapping option as stored in a config entry
///
/// Strings go through [`parse_mapping`]; objects are read directly.
pub fn parse_mapping_value(value: Option<&Value>) -> NameMap {
    match value {
        None | Some(Value::Null) => NameMap::new(),
        Some(Value::String(text)) => parse_mapping(text),
        Some(Value::Object(object)) => map_from_json(object).unwrap_or_else(|| {
            warn!("Ignoring name mapping with non-integer keys");
            NameMap::new()
        }),
        Some(other) => {
            warn!("Ignoring name mapping of unexpected type: {}", other);
            NameMap::new()
        }
    }
}

/// `None` when a key is not an integer; integer keys outside the u8 range
/// are skipped one by one
fn map_from_json(object: &serde_json::Map<String, Value>) -> Option<NameMap> {
    let mut map = NameMap::new();
    for (key, value) in object {
        let id = key.trim().parse::<i128>().ok()?;
        let Ok(id) = u8::try_from(id) else {
            debug!("Skipping mapping id {} outside the zone/source range", id);
            continue;
        };
        map.insert(id, json_name(value));
    }
    Some(map)
}

/// Display text of a JSON value, spelled the way the options UI stores it
fn json_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

/// Ids outside the u8 range cannot name a zone or source and are dropped
fn parse_id(key: &str) -> Option<u8> {
    key.trim().parse::<i128>().ok().and_then(|id| u8::try_from(id).ok())
}

/// Name mapping as written in YAML: either option text or a map
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NameMapConfig {
    Text(String),
    Map(NameMap),
}

impl NameMapConfig {
    pub fn to_map(&self) -> NameMap {
        match self {
            NameMapConfig::Text(text) => parse_mapping(text),
            NameMapConfig::Map(map) => map.clone(),
        }
    }
}

/// Empty or "Unused" (any case) names are hidden
pub fn is_hidden(name: &str) -> bool {
    name.is_empty() || name.to_lowercase() == UNUSED_NAME
}

/// Default zone name; zones past the generic range carry the device name
pub fn generic_zone_name(zone: u8, device_name: &str) -> String {
    if (1..=GENERIC_ZONE_NAME_LIMIT).contains(&zone) {
        format!("Zone {}", zone)
    } else {
        format!("Zone {} ({})", zone, device_name)
    }
}

pub fn generic_source_name(source: u8) -> String {
    format!("Source {}", source)
}

/// Zone and source names of one amplifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendlyNames {
    zones: NameMap,
    sources: NameMap,
}

impl FriendlyNames {
    pub fn new(zones: NameMap, sources: NameMap) -> Self {
        Self { zones, sources }
    }

    /// Override, else generic name; `None` when hidden
    pub fn zone_name(&self, zone: u8, device_name: &str) -> Option<String> {
        let name = self
            .zones
            .get(&zone)
            .cloned()
            .unwrap_or_else(|| generic_zone_name(zone, device_name));
        (!is_hidden(&name)).then_some(name)
    }

    /// Override, else generic name; `None` when hidden
    pub fn source_name(&self, source: u8) -> Option<String> {
        let name = self
            .sources
            .get(&source)
            .cloned()
            .unwrap_or_else(|| generic_source_name(source));
        (!is_hidden(&name)).then_some(name)
    }

    /// Visible source names for sources `1..=source_count`
    pub fn source_list(&self, source_count: u8) -> Vec<String> {
        (1..=source_count)
            .filter_map(|source| self.source_name(source))
            .collect()
    }

    /// Source id for a name from [`source_list`](Self::source_list)
    ///
    /// The generic "Source k" spelling also resolves unless source k is
    /// hidden; a friendly name always wins over it.
    pub fn source_id(&self, name: &str, source_count: u8) -> Option<u8> {
        (1..=source_count)
            .find(|&source| self.source_name(source).as_deref() == Some(name))
            .or_else(|| {
                (1..=source_count).find(|&source| {
                    generic_source_name(source) == name && self.source_name(source).is_some()
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(pairs: &[(u8, &str)]) -> NameMap {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_mapping("").is_empty());
        assert!(parse_mapping("   ").is_empty());
    }

    #[test]
    fn test_parse_json() {
        let map = parse_mapping(r#"{"1": "Kitchen", "2": "Patio", "3": 4}"#);
        assert_eq!(map, names(&[(1, "Kitchen"), (2, "Patio"), (3, "4")]));
    }

    #[test]
    fn test_json_out_of_range_ids_are_skipped() {
        let text = r#"{"1": "Kitchen", "300": "Spare", "-1": "Nowhere"}"#;
        assert_eq!(parse_mapping(text), names(&[(1, "Kitchen")]));

        let value = json!({"1": "Kitchen", "-1": "x", "256": "y", "4": "Den"});
        assert_eq!(
            parse_mapping_value(Some(&value)),
            names(&[(1, "Kitchen"), (4, "Den")])
        );
    }

    #[test]
    fn test_json_scalar_values() {
        let map = parse_mapping(r#"{"1": null, "2": true, "3": false, "4": 2.5}"#);
        assert_eq!(
            map,
            names(&[(1, "None"), (2, "True"), (3, "False"), (4, "2.5")])
        );
    }

    #[test]
    fn test_parse_pairs() {
        let map = parse_mapping("1=Kitchen, 2 = Patio ,bad,x=Nope,3=a=b");
        assert_eq!(map, names(&[(1, "Kitchen"), (2, "Patio"), (3, "a=b")]));
    }

    #[test]
    fn test_parse_later_pairs_win() {
        assert_eq!(parse_mapping("1=Den,1=Office"), names(&[(1, "Office")]));
    }

    #[test]
    fn test_json_with_bad_keys_falls_back_to_pairs() {
        // Not usable as JSON and no k=v pairs either
        assert!(parse_mapping(r#"{"one": "Kitchen"}"#).is_empty());
        // A JSON array is not a mapping
        assert!(parse_mapping("[1, 2]").is_empty());
    }

    #[test]
    fn test_parse_mapping_value() {
        assert!(parse_mapping_value(None).is_empty());
        assert!(parse_mapping_value(Some(&json!(null))).is_empty());
        assert_eq!(
            parse_mapping_value(Some(&json!("4=Garage"))),
            names(&[(4, "Garage")])
        );
        assert_eq!(
            parse_mapping_value(Some(&json!({"5": "Pool"}))),
            names(&[(5, "Pool")])
        );
        assert!(parse_mapping_value(Some(&json!(42))).is_empty());
    }

    #[test]
    fn test_zone_name_fallbacks() {
        let friendly = FriendlyNames::new(names(&[(1, "Kitchen"), (2, "UNUSED")]), NameMap::new());

        assert_eq!(friendly.zone_name(1, "Amp").as_deref(), Some("Kitchen"));
        assert_eq!(friendly.zone_name(2, "Amp"), None);
        assert_eq!(friendly.zone_name(3, "Amp").as_deref(), Some("Zone 3"));
        assert_eq!(friendly.zone_name(12, "Amp").as_deref(), Some("Zone 12"));
        assert_eq!(friendly.zone_name(13, "Amp").as_deref(), Some("Zone 13 (Amp)"));
    }

    #[test]
    fn test_empty_name_is_hidden() {
        let friendly = FriendlyNames::new(names(&[(1, "")]), names(&[(2, "unused")]));
        assert_eq!(friendly.zone_name(1, "Amp"), None);
        assert_eq!(friendly.source_name(2), None);
        assert!(!is_hidden(" Unused"));
    }

    #[test]
    fn test_source_list_skips_hidden() {
        let friendly = FriendlyNames::new(
            NameMap::new(),
            names(&[(1, "Tuner"), (3, "Unused"), (9, "Beyond")]),
        );
        assert_eq!(
            friendly.source_list(4),
            vec!["Tuner", "Source 2", "Source 4"]
        );
        assert!(friendly.source_list(0).is_empty());
    }

    #[test]
    fn test_source_id_lookup() {
        let friendly = FriendlyNames::new(
            NameMap::new(),
            names(&[(1, "Tuner"), (2, "Source 1"), (3, "Unused")]),
        );

        assert_eq!(friendly.source_id("Tuner", 6), Some(1));
        // Friendly name beats the generic spelling of another source
        assert_eq!(friendly.source_id("Source 1", 6), Some(2));
        assert_eq!(friendly.source_id("Source 4", 6), Some(4));
        assert_eq!(friendly.source_id("Source 3", 6), None);
        assert_eq!(friendly.source_id("Source 7", 6), None);
        assert_eq!(friendly.source_id("Vinyl", 6), None);
    }

    #[test]
    fn test_name_map_config_yaml() {
        let text: NameMapConfig = serde_yaml::from_str("\"1=Kitchen\"").unwrap();
        assert_eq!(text.to_map(), names(&[(1, "Kitchen")]));

        let map: NameMapConfig = serde_yaml::from_str("1: Kitchen\n2: Unused\n").unwrap();
        assert_eq!(map.to_map(), names(&[(1, "Kitchen"), (2, "Unused")]));
    }
}
