//! Event bus with typed pub/sub
//!
//! Each event type gets its own broadcast channel, created lazily on first
//! subscription. Firing an event nobody listens to is a no-op.

use dashmap::DashMap;
use ha_core::{Context, Event, EventData, EventType};
use std::marker::PhantomData;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

type RawEvent = Event<serde_json::Value>;

/// Broadcast bus for host events
pub struct EventBus {
    listeners: DashMap<EventType, broadcast::Sender<RawEvent>>,
    capacity: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            listeners: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to raw events of one type
    pub fn subscribe(&self, event_type: impl Into<EventType>) -> broadcast::Receiver<RawEvent> {
        let event_type = event_type.into();
        trace!(event_type = %event_type, "Subscribing to event type");

        self.listeners
            .entry(event_type)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Subscribe to events whose payload deserializes into `T`
    pub fn subscribe_typed<T: EventData + serde::de::DeserializeOwned>(
        &self,
    ) -> TypedEventReceiver<T> {
        TypedEventReceiver {
            rx: self.subscribe(T::event_type()),
            _phantom: PhantomData,
        }
    }

    /// Deliver an event to every subscriber of its type
    pub fn fire(&self, event: RawEvent) {
        debug!(event_type = %event.event_type, "Firing event");

        if let Some(sender) = self.listeners.get(&event.event_type) {
            // A send error only means there is no live receiver
            let _ = sender.send(event);
        }
    }

    /// Serialize a typed payload and fire it
    pub fn fire_typed<T: EventData + serde::Serialize>(&self, data: T, context: Context) {
        let event = Event::typed(data, context);
        match serde_json::to_value(&event.data) {
            Ok(json) => self.fire(event.map(|_| json)),
            Err(e) => warn!(event_type = %event.event_type, "Dropping unserializable event: {}", e),
        }
    }

    /// Number of event types with a channel
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver that yields only events whose payload parses as `T`
pub struct TypedEventReceiver<T> {
    rx: broadcast::Receiver<RawEvent>,
    _phantom: PhantomData<T>,
}

impl<T: EventData + serde::de::DeserializeOwned> TypedEventReceiver<T> {
    /// Wait for the next event with a well-formed payload
    pub async fn recv(&mut self) -> Result<Event<T>, broadcast::error::RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if let Ok(data) = serde_json::from_value::<T>(event.data.clone()) {
                return Ok(event.map(|_| data));
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Result<Event<T>, broadcast::error::TryRecvError> {
        loop {
            let event = self.rx.try_recv()?;
            if let Ok(data) = serde_json::from_value::<T>(event.data.clone()) {
                return Ok(event.map(|_| data));
            }
        }
    }
}
