//! Multi-payload envelope handed to the relay.
//!
//! The relay expects one top-level key per delivery channel whose value is
//! that channel's payload, itself encoded as a JSON string, plus a `default`
//! key holding the raw text. The outer document is encoded once more when it
//! is published, so payloads end up double-encoded on the wire.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::Platform;

/// Key holding the raw text for channels without a dedicated payload
pub const DEFAULT_CHANNEL: &str = "default";

/// Rendered payloads keyed by relay channel name
#[derive(Debug, Clone, PartialEq)]
pub struct PushEnvelope {
    channels: Map<String, Value>,
}

impl PushEnvelope {
    pub(crate) fn new(text: Option<String>) -> Self {
        let mut channels = Map::new();
        channels.insert(
            DEFAULT_CHANNEL.to_string(),
            text.map(Value::String).unwrap_or(Value::Null),
        );
        Self { channels }
    }

    pub(crate) fn insert(&mut self, platform: Platform, payload: String) {
        for channel in platform.channels() {
            self.channels
                .insert((*channel).to_string(), Value::String(payload.clone()));
        }
    }

    /// Raw text of the message, if any
    pub fn default_text(&self) -> Option<&str> {
        self.channels.get(DEFAULT_CHANNEL).and_then(Value::as_str)
    }

    /// Encoded payload for a relay channel such as `APNS` or `GCM`
    pub fn get(&self, channel: &str) -> Option<&str> {
        if channel == DEFAULT_CHANNEL {
            return None;
        }
        self.channels.get(channel).and_then(Value::as_str)
    }

    /// Decode a channel payload back into JSON
    pub fn decode(&self, channel: &str) -> Option<Value> {
        self.get(channel)
            .and_then(|payload| serde_json::from_str(payload).ok())
    }

    /// Channel names present, `default` first
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Number of keys including `default`
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Encode the outer envelope as sent to the relay
    pub fn to_json(&self) -> String {
        Value::Object(self.channels.clone()).to_string()
    }
}

impl Serialize for PushEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.channels.serialize(serializer)
    }
}
