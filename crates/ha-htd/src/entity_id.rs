//! Entity and unique ids for zone entities

use ha_components::media_player::DOMAIN as MEDIA_PLAYER_DOMAIN;
use ha_core::{EntityId, EntityIdError};

/// Replace every non-alphanumeric character with `_`, collapse runs and trim
pub fn make_alphanumeric(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Digits used for the zone number in entity ids
pub fn zone_width(model_zones: u8) -> usize {
    if model_zones > 10 {
        2
    } else {
        1
    }
}

/// `media_player.{device}_zone_{zone}`, lower-cased
pub fn media_player_entity_id(
    device_name: &str,
    zone: u8,
    width: usize,
) -> Result<EntityId, EntityIdError> {
    let slug = make_alphanumeric(device_name).to_lowercase();
    let object_id = if slug.is_empty() {
        format!("zone_{:0width$}", zone, width = width)
    } else {
        format!("{}_zone_{:0width$}", slug, zone, width = width)
    };
    EntityId::new(MEDIA_PLAYER_DOMAIN, object_id)
}

pub fn zone_unique_id(device_unique_id: &str, zone: u8) -> String {
    format!("{}_{:02}", device_unique_id, zone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_alphanumeric() {
        assert_eq!(make_alphanumeric("Living Room Amp"), "Living_Room_Amp");
        assert_eq!(make_alphanumeric("  MCA-66 / Main  "), "MCA_66_Main");
        assert_eq!(make_alphanumeric("Café"), "Caf");
        assert_eq!(make_alphanumeric("***"), "");
    }

    #[test]
    fn test_zone_width() {
        assert_eq!(zone_width(6), 1);
        assert_eq!(zone_width(10), 1);
        assert_eq!(zone_width(12), 2);
    }

    #[test]
    fn test_entity_id() {
        let id = media_player_entity_id("Living Room Amp", 3, 1).unwrap();
        assert_eq!(id.to_string(), "media_player.living_room_amp_zone_3");

        let id = media_player_entity_id("Lync 12", 4, 2).unwrap();
        assert_eq!(id.to_string(), "media_player.lync_12_zone_04");

        let id = media_player_entity_id("Lync 12", 11, 2).unwrap();
        assert_eq!(id.to_string(), "media_player.lync_12_zone_11");
    }

    #[test]
    fn test_entity_id_without_slug() {
        let id = media_player_entity_id("!!!", 2, 1).unwrap();
        assert_eq!(id.to_string(), "media_player.zone_2");
    }

    #[test]
    fn test_unique_id() {
        assert_eq!(zone_unique_id("mca66-001", 3), "mca66-001_03");
        assert_eq!(zone_unique_id("lync", 12), "lync_12");
    }
}
