//! Config entry and YAML platform setup

mod common;

use common::{legacy_platform, state_machine, FakeHtdClient};
use ha_components::Entity;
use ha_config_entries::{ConfigEntry, ConfigEntryState};
use ha_htd::{
    async_setup_entry, async_setup_platform, async_unload_entry, create_platform,
    load_platform_config, HtdClient, HtdError, HtdModel,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn entry(title: &str) -> ConfigEntry {
    ConfigEntry::new("htd", title)
        .with_data(HashMap::from([("unique_id".to_string(), json!("mca66-001"))]))
}

#[tokio::test]
async fn test_setup_entry_creates_one_entity_per_zone() {
    let states = state_machine();
    let mut entry = entry("Living Room Amp");
    let platform = create_platform(&entry, states.clone());
    let client = FakeHtdClient::mca66();

    let added = assert_ok!(async_setup_entry(&mut entry, client.clone(), &platform).await);

    assert_eq!(added, 6);
    assert_eq!(entry.state, ConfigEntryState::Loaded);
    assert_eq!(client.subscriber_count(), 6);
    assert_eq!(
        platform.entity_ids(),
        (1..=6)
            .map(|zone| format!("media_player.living_room_amp_zone_{}", zone))
            .collect::<Vec<_>>()
    );

    let state = states.get("media_player.living_room_amp_zone_1").unwrap();
    assert_eq!(state.state, "off");
    assert_eq!(state.attribute::<String>("friendly_name").unwrap(), "Zone 1");
    assert_eq!(state.attribute::<String>("icon").unwrap(), "mdi:disc-player");
    assert_eq!(state.attribute::<u32>("supported_features"), Some(3468));

    let entity = platform.entity("media_player.living_room_amp_zone_4").unwrap();
    assert_eq!(entity.unique_id(), Some("mca66-001_04"));
}

#[tokio::test]
async fn test_wide_models_pad_zone_numbers() {
    let states = state_machine();
    let mut entry = entry("Lync 12");
    let platform = create_platform(&entry, states.clone());
    let client = FakeHtdClient::new(HtdModel::new("Lync12", 12, 18));

    async_setup_entry(&mut entry, client, &platform).await.unwrap();

    let ids = platform.entity_ids();
    assert_eq!(ids.len(), 12);
    assert_eq!(ids[0], "media_player.lync_12_zone_01");
    assert_eq!(ids[11], "media_player.lync_12_zone_12");
}

#[tokio::test]
async fn test_friendly_names_from_options() {
    let states = state_machine();
    let mut entry = entry("Amp").with_options(HashMap::from([
        ("zones".to_string(), json!(r#"{"1": "Kitchen", "3": "Unused"}"#)),
        ("sources".to_string(), json!("1=Tuner, 2=Unused, 5=Streamer")),
    ]));
    let platform = create_platform(&entry, states.clone());

    async_setup_entry(&mut entry, FakeHtdClient::mca66(), &platform)
        .await
        .unwrap();

    let kitchen = states.get("media_player.amp_zone_1").unwrap();
    assert_eq!(kitchen.attribute::<String>("friendly_name").unwrap(), "Kitchen");
    assert_eq!(
        kitchen.attribute::<Vec<String>>("source_list").unwrap(),
        vec!["Tuner", "Source 3", "Source 4", "Streamer", "Source 6"]
    );

    // Hidden zones still get an entity, just without a friendly name
    let hidden = states.get("media_player.amp_zone_3").unwrap();
    assert_eq!(hidden.attribute::<String>("friendly_name"), None);
}

#[tokio::test]
async fn test_unload_entry_unsubscribes_and_clears_states() {
    let states = state_machine();
    let mut entry = entry("Amp");
    let platform = create_platform(&entry, states.clone());
    let client = FakeHtdClient::mca66();
    async_setup_entry(&mut entry, client.clone(), &platform)
        .await
        .unwrap();

    let removed = assert_ok!(async_unload_entry(&mut entry, &platform).await);

    assert_eq!(removed, 6);
    assert_eq!(entry.state, ConfigEntryState::NotLoaded);
    assert_eq!(client.subscriber_count(), 0);
    assert!(platform.is_empty());
    assert!(states.entity_ids("media_player").is_empty());

    // The entry can be set up again after unloading
    async_setup_entry(&mut entry, client.clone(), &platform)
        .await
        .unwrap();
    assert_eq!(client.subscriber_count(), 6);
}

#[tokio::test]
async fn test_setup_twice_is_rejected() {
    let states = state_machine();
    let mut entry = entry("Amp");
    let platform = create_platform(&entry, states);
    async_setup_entry(&mut entry, FakeHtdClient::mca66(), &platform)
        .await
        .unwrap();

    let err = assert_err!(async_setup_entry(&mut entry, FakeHtdClient::mca66(), &platform).await);
    assert!(matches!(err, HtdError::Lifecycle(_)));
    assert_eq!(entry.state, ConfigEntryState::Loaded);
    assert_eq!(platform.len(), 6);
}

#[tokio::test]
async fn test_setup_error_records_reason() {
    let states = state_machine();
    let other = ConfigEntry::new("htd", "Other");
    let platform = create_platform(&other, states);
    let mut entry = entry("Amp");

    let err = async_setup_entry(&mut entry, FakeHtdClient::mca66(), &platform)
        .await
        .unwrap_err();

    assert!(matches!(err, HtdError::InvalidConfig { .. }));
    assert_eq!(entry.state, ConfigEntryState::SetupError);
    assert!(entry.reason.as_deref().unwrap().contains(&other.entry_id));
    assert!(platform.is_empty());
}

#[tokio::test]
async fn test_yaml_platform_setup() {
    let states = state_machine();
    let platform = legacy_platform(states.clone());
    let devices = load_platform_config(
        r#"
- unique_id: upstairs
  device_name: Upstairs
  zones: "2=Bedroom"
- unique_id: downstairs
  device_name: Downstairs
"#,
    )
    .unwrap();

    let upstairs = FakeHtdClient::mca66();
    let downstairs = FakeHtdClient::new(HtdModel::new("MC-66", 2, 6));
    let clients = vec![
        upstairs.clone() as Arc<dyn HtdClient>,
        downstairs.clone() as Arc<dyn HtdClient>,
    ];

    let added = async_setup_platform(devices.into_iter().zip(clients).collect(), &platform)
        .await
        .unwrap();

    assert_eq!(added, 8);
    assert_eq!(upstairs.subscriber_count(), 6);
    assert_eq!(downstairs.subscriber_count(), 2);

    let bedroom = states.get("media_player.upstairs_zone_2").unwrap();
    assert_eq!(bedroom.attribute::<String>("friendly_name").unwrap(), "Bedroom");
    assert!(states.get("media_player.downstairs_zone_2").is_some());
}
