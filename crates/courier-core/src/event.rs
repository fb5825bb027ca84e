// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The event value routed by a dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// An event emitted by a target and routed to the listeners registered for it.
///
/// An event is addressed by its target identifier (the component that emitted
/// it, e.g. `"win1"`) and its name (e.g. `"window.event.ready"`). Any other
/// data travels in the payload. On the wire the target identifier is named
/// `targetID` and every field other than `targetID` and `name` is collected
/// into the payload.
///
/// Events are immutable once built; use the `with_*` builders to attach data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "targetID")]
    target_id: String,
    name: String,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Event {
    /// Creates an event with an empty payload.
    pub fn new(target_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            name: name.into(),
            payload: Map::new(),
        }
    }

    /// Attaches a payload entry, returning the updated event.
    ///
    /// The keys `targetID` and `name` are reserved for addressing and are
    /// ignored here.
    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "targetID" && key != "name" {
            self.payload.insert(key, value.into());
        }
        self
    }

    /// Parses an event from its JSON representation.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Serializes the event to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// The identifier of the target that emitted this event.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// The event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All payload entries.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// A single payload entry, if present.
    pub fn payload_value(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target_id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_creation() {
        let event = Event::new("win1", "window.event.ready");
        assert_eq!(event.target_id(), "win1");
        assert_eq!(event.name(), "window.event.ready");
        assert!(event.payload().is_empty());
        assert_eq!(event.to_string(), "win1:window.event.ready");
    }

    #[test]
    fn test_payload_builder_ignores_reserved_keys() {
        let event = Event::new("win1", "resize")
            .with_payload("width", 800)
            .with_payload("name", "spoofed")
            .with_payload("targetID", "win2");

        assert_eq!(event.name(), "resize");
        assert_eq!(event.target_id(), "win1");
        assert_eq!(event.payload().len(), 1);
        assert_eq!(event.payload_value("width"), Some(&json!(800)));
    }

    #[test]
    fn test_from_json_collects_extra_fields_into_payload() {
        let raw = r#"{"name":"window.event.moved","targetID":"win3","bounds":{"x":10,"y":20}}"#;
        let event = Event::from_json(raw).expect("valid event JSON");

        assert_eq!(event.target_id(), "win3");
        assert_eq!(event.name(), "window.event.moved");
        assert_eq!(
            event.payload_value("bounds"),
            Some(&json!({"x": 10, "y": 20}))
        );
    }

    #[test]
    fn test_from_json_requires_addressing_fields() {
        assert!(Event::from_json(r#"{"name":"ready"}"#).is_err());
        assert!(Event::from_json(r#"{"targetID":"win1"}"#).is_err());
    }

    #[test]
    fn test_to_json_uses_wire_names() {
        let event = Event::new("app", "app.event.ready").with_payload("pid", 42);
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({"targetID": "app", "name": "app.event.ready", "pid": 42})
        );
    }
}
