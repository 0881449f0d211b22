//! Item handles and update events

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque token identifying one subscription instance.
///
/// The host creates it when subscribing and receives it back with every update,
/// so it can route the update to the right subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemHandle(String);

impl ItemHandle {
    /// Create a handle from a host-chosen token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Create a handle with a fresh random token
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field mapping delivered to the host for one update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemEvent {
    fields: HashMap<String, String>,
}

impl ItemEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field names, in no particular order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the fields as a JSON object string
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_default()
    }
}

/// One record of the greetings feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingEvent {
    pub message: String,
    pub timestamp: String,
}

impl GreetingEvent {
    /// Create a greeting stamped with the current time
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl From<GreetingEvent> for ItemEvent {
    fn from(event: GreetingEvent) -> Self {
        ItemEvent::new()
            .with_field("message", event.message)
            .with_field("timestamp", event.timestamp)
    }
}
