//! Entity contract and entity platforms
//!
//! Integrations expose devices as [`Entity`] objects and hand them to an
//! [`EntityPlatform`], which drives their lifecycle and publishes their state
//! to the [`StateMachine`] through a [`StateWriter`].

use async_trait::async_trait;
use dashmap::DashMap;
use ha_core::{
    Context, EntityId, State, ATTR_FRIENDLY_NAME, ATTR_ICON, STATE_UNAVAILABLE, STATE_UNKNOWN,
};
use ha_state_machine::StateMachine;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

/// An object whose state is published to the state machine
///
/// Property methods are cheap reads of cached data; I/O belongs in
/// [`update`](Entity::update) or in the integration's push callbacks.
#[async_trait]
pub trait Entity: Send + Sync {
    fn entity_id(&self) -> &EntityId;

    /// Stable identifier used to detect duplicates
    fn unique_id(&self) -> Option<&str> {
        None
    }

    /// Display name; `None` leaves the entity without a friendly name
    fn name(&self) -> Option<String> {
        None
    }

    fn icon(&self) -> Option<&str> {
        None
    }

    /// Whether the platform should call [`update`](Entity::update) periodically
    fn should_poll(&self) -> bool {
        true
    }

    fn available(&self) -> bool {
        true
    }

    /// Disabled entities have no state in the state machine
    fn enabled(&self) -> bool {
        true
    }

    /// State value; `None` is published as `unknown`
    fn state(&self) -> Option<String>;

    /// Attributes describing what the entity can do, written even when unavailable
    fn capability_attributes(&self) -> HashMap<String, Value> {
        HashMap::new()
    }

    /// Attributes describing the current state, written only while available
    fn state_attributes(&self) -> HashMap<String, Value> {
        HashMap::new()
    }

    /// Fetch fresh data for polling entities
    async fn update(&self) {}

    /// Called once the entity is registered on a platform
    async fn added_to_hass(&self, _writer: StateWriter) {}

    /// Called before the entity is removed from its platform
    async fn will_remove_from_hass(&self) {}
}

/// Compose the published state value and attributes of an entity
pub fn compose_state<E: Entity + ?Sized>(entity: &E) -> (String, HashMap<String, Value>) {
    let mut attributes = entity.capability_attributes();

    let state = if entity.available() {
        attributes.extend(entity.state_attributes());
        entity.state().unwrap_or_else(|| STATE_UNKNOWN.to_string())
    } else {
        STATE_UNAVAILABLE.to_string()
    };

    if let Some(name) = entity.name() {
        attributes.insert(ATTR_FRIENDLY_NAME.to_string(), json!(name));
    }
    if let Some(icon) = entity.icon() {
        attributes.insert(ATTR_ICON.to_string(), json!(icon));
    }

    (state, attributes)
}

/// Handle entities use to publish their state
#[derive(Clone)]
pub struct StateWriter {
    states: Arc<StateMachine>,
}

impl StateWriter {
    pub fn new(states: Arc<StateMachine>) -> Self {
        Self { states }
    }

    /// Publish the entity's current state
    pub fn write<E: Entity + ?Sized>(&self, entity: &E) -> Option<State> {
        self.write_with_context(entity, Context::new())
    }

    /// Publish the entity's current state, attributing it to `context`
    ///
    /// A disabled entity has its state removed instead and `None` is returned.
    #[instrument(skip_all, fields(entity_id = %entity.entity_id()))]
    pub fn write_with_context<E: Entity + ?Sized>(
        &self,
        entity: &E,
        context: Context,
    ) -> Option<State> {
        if !entity.enabled() {
            trace!("Entity disabled, clearing state");
            self.states.remove(entity.entity_id(), context);
            return None;
        }

        let (state, attributes) = compose_state(entity);
        Some(
            self.states
                .set(entity.entity_id().clone(), state, attributes, context),
        )
    }

    /// Drop the entity's state
    pub fn clear(&self, entity_id: &EntityId) -> Option<State> {
        self.states.remove(entity_id, Context::new())
    }
}

/// The entities one integration contributes to one domain
///
/// A platform belongs to at most one config entry, so unloading the entry is
/// a [`reset`](EntityPlatform::reset).
pub struct EntityPlatform<E: ?Sized> {
    domain: String,
    platform_name: String,
    config_entry_id: Option<String>,
    writer: StateWriter,
    /// Entities keyed by entity_id string
    entities: DashMap<String, Arc<E>>,
    /// unique_id -> entity_id string
    unique_ids: DashMap<String, String>,
}

impl<E: Entity + ?Sized> EntityPlatform<E> {
    pub fn new(
        domain: impl Into<String>,
        platform_name: impl Into<String>,
        states: Arc<StateMachine>,
    ) -> Self {
        Self {
            domain: domain.into(),
            platform_name: platform_name.into(),
            config_entry_id: None,
            writer: StateWriter::new(states),
            entities: DashMap::new(),
            unique_ids: DashMap::new(),
        }
    }

    /// Tie this platform to a config entry
    pub fn for_config_entry(mut self, entry_id: impl Into<String>) -> Self {
        self.config_entry_id = Some(entry_id.into());
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn platform_name(&self) -> &str {
        &self.platform_name
    }

    pub fn config_entry_id(&self) -> Option<&str> {
        self.config_entry_id.as_deref()
    }

    pub fn writer(&self) -> &StateWriter {
        &self.writer
    }

    /// Register entities, run their `added_to_hass` hook and publish state
    ///
    /// Entities of another domain or with a duplicate entity_id/unique_id are
    /// skipped. Returns the number of entities added.
    pub async fn add_entities(&self, entities: Vec<Arc<E>>, update_before_add: bool) -> usize {
        let mut added = 0;

        for entity in entities {
            let entity_id = entity.entity_id().to_string();

            if entity.entity_id().domain() != self.domain {
                warn!(
                    platform = %self.platform_name,
                    "Entity {} does not belong to domain {}", entity_id, self.domain
                );
                continue;
            }
            if self.entities.contains_key(&entity_id) {
                warn!(platform = %self.platform_name, "Entity {} already exists", entity_id);
                continue;
            }
            if let Some(unique_id) = entity.unique_id() {
                if let Some(existing) = self.unique_ids.get(unique_id) {
                    warn!(
                        platform = %self.platform_name,
                        "Unique id {} already used by {}, skipping {}",
                        unique_id,
                        existing.value(),
                        entity_id
                    );
                    continue;
                }
                self.unique_ids
                    .insert(unique_id.to_string(), entity_id.clone());
            }

            if update_before_add {
                entity.update().await;
            }

            self.entities.insert(entity_id.clone(), entity.clone());
            entity.added_to_hass(self.writer.clone()).await;
            self.writer.write(entity.as_ref());

            debug!(platform = %self.platform_name, "Added entity {}", entity_id);
            added += 1;
        }

        if added > 0 {
            info!(
                "Set up {} {} entities for platform {}",
                added, self.domain, self.platform_name
            );
        }
        added
    }

    /// Remove one entity and its state
    pub async fn remove_entity(&self, entity_id: &str) -> bool {
        let Some((_, entity)) = self.entities.remove(entity_id) else {
            return false;
        };

        entity.will_remove_from_hass().await;
        if let Some(unique_id) = entity.unique_id() {
            self.unique_ids.remove(unique_id);
        }
        self.writer.clear(entity.entity_id());

        debug!(platform = %self.platform_name, "Removed entity {}", entity_id);
        true
    }

    /// Remove every entity of this platform
    pub async fn reset(&self) -> usize {
        let mut removed = 0;
        for entity_id in self.entity_ids() {
            if self.remove_entity(&entity_id).await {
                removed += 1;
            }
        }
        removed
    }

    pub fn entity(&self, entity_id: &str) -> Option<Arc<E>> {
        self.entities.get(entity_id).map(|e| e.value().clone())
    }

    /// Registered entity ids, sorted
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entities.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Update and republish every polling entity
    pub async fn async_poll(&self) -> usize {
        let polled: Vec<Arc<E>> = self
            .entities
            .iter()
            .filter(|r| r.value().should_poll())
            .map(|r| r.value().clone())
            .collect();

        for entity in &polled {
            entity.update().await;
            self.writer.write(entity.as_ref());
        }
        polled.len()
    }
}
