//! Service call type

use crate::{Context, ATTR_ENTITY_ID};
use serde::{Deserialize, Serialize};

/// A request to run `domain.service`, e.g. `media_player.volume_set`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    /// Service data, including the `entity_id` target
    pub service_data: serde_json::Value,
    pub context: Context,
}

impl ServiceCall {
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Typed lookup of a service data field
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.service_data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Targeted entity ids; accepts a single string or an array
    pub fn entity_ids(&self) -> Vec<String> {
        match self.service_data.get(ATTR_ENTITY_ID) {
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            Some(serde_json::Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_ids_single_and_list() {
        let single = ServiceCall::new(
            "media_player",
            "turn_on",
            json!({"entity_id": "media_player.den_zone_1"}),
            Context::new(),
        );
        assert_eq!(single.entity_ids(), vec!["media_player.den_zone_1"]);

        let many = ServiceCall::new(
            "media_player",
            "turn_off",
            json!({"entity_id": ["media_player.a", "media_player.b", 3]}),
            Context::new(),
        );
        assert_eq!(many.entity_ids(), vec!["media_player.a", "media_player.b"]);
    }

    #[test]
    fn test_get_typed_field() {
        let call = ServiceCall::new(
            "media_player",
            "volume_set",
            json!({"volume_level": 0.5}),
            Context::new(),
        );
        assert_eq!(call.get::<f64>("volume_level"), Some(0.5));
        assert_eq!(call.get::<String>("volume_level"), None);
        assert_eq!(call.get::<f64>("missing"), None);
    }
}
