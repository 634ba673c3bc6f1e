//! Traits for the notification relay and device registry.
//!
//! The relay publishes an already-encoded multi-payload envelope to one
//! endpoint; the registry lists the endpoints registered under a platform
//! application. Both are external services, so implementations live outside
//! the encoding core and are injected into [`crate::service::Messages`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message structure telling the relay the body is a per-channel JSON envelope
pub const MESSAGE_STRUCTURE_JSON: &str = "json";

/// Errors reported by relay or registry implementations
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay rejected or failed the request
    #[error("Publish failed: {0}")]
    Publish(String),
}

/// Typed attribute attached beside the message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageAttribute {
    pub data_type: String,
    pub string_value: String,
}

impl MessageAttribute {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: "String".to_string(),
            string_value: value.into(),
        }
    }
}

/// A single publish call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublishRequest {
    /// Endpoint the message is delivered to
    pub target_arn: String,
    /// Encoded envelope
    pub message: String,
    /// Always `json` for envelopes
    pub message_structure: String,
    /// Delivery hints read by the relay, never part of the body
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub message_attributes: BTreeMap<String, MessageAttribute>,
}

/// A device endpoint registered with a platform application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub arn: String,
    pub enabled: bool,
}

impl Endpoint {
    pub fn new(arn: impl Into<String>, enabled: bool) -> Self {
        Self {
            arn: arn.into(),
            enabled,
        }
    }
}

/// Publishes encoded envelopes
#[async_trait]
pub trait PushRelay: Send + Sync {
    /// Publish a message to its target endpoint
    async fn publish(&self, request: PublishRequest) -> Result<(), RelayError>;
}

/// Lists device endpoints per platform application
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// All endpoints registered under the application, enabled or not
    async fn endpoints(&self, application_arn: &str) -> Result<Vec<Endpoint>, RelayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_request_wire_names() {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "AWS.SNS.MOBILE.APNS.PUSH_TYPE".to_string(),
            MessageAttribute::string("alert"),
        );
        let request = PublishRequest {
            target_arn: "arn:endpoint/1".to_string(),
            message: "{}".to_string(),
            message_structure: MESSAGE_STRUCTURE_JSON.to_string(),
            message_attributes: attributes,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "TargetArn": "arn:endpoint/1",
                "Message": "{}",
                "MessageStructure": "json",
                "MessageAttributes": {
                    "AWS.SNS.MOBILE.APNS.PUSH_TYPE": {"DataType": "String", "StringValue": "alert"}
                }
            })
        );
    }

    #[test]
    fn test_empty_attributes_omitted() {
        let request = PublishRequest {
            target_arn: "arn:endpoint/1".to_string(),
            message: "{}".to_string(),
            message_structure: MESSAGE_STRUCTURE_JSON.to_string(),
            message_attributes: BTreeMap::new(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("MessageAttributes").is_none());
    }
}
