//! In-memory relay and registry backed by DashMap.
//!
//! Publishes are recorded per endpoint instead of being delivered, which makes
//! these useful for debug runs and tests.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use super::backend::{DeviceRegistry, Endpoint, PublishRequest, PushRelay, RelayError};

/// Relay that records every published request
#[derive(Default)]
pub struct MemoryRelay {
    /// Published requests per target endpoint
    published: DashMap<String, Vec<PublishRequest>>,
    /// Endpoints that reject publishes
    failing: DashSet<String>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish to `endpoint_arn` fail
    pub fn fail_endpoint(&self, endpoint_arn: impl Into<String>) {
        self.failing.insert(endpoint_arn.into());
    }

    /// Requests published to one endpoint, oldest first
    pub fn published_to(&self, endpoint_arn: &str) -> Vec<PublishRequest> {
        self.published
            .get(endpoint_arn)
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Total number of recorded publishes
    pub fn total_published(&self) -> usize {
        self.published.iter().map(|entry| entry.value().len()).sum()
    }
}

#[async_trait]
impl PushRelay for MemoryRelay {
    async fn publish(&self, request: PublishRequest) -> Result<(), RelayError> {
        if self.failing.contains(&request.target_arn) {
            return Err(RelayError::Publish(format!(
                "publish to {} rejected",
                request.target_arn
            )));
        }

        tracing::debug!(
            target_arn = %request.target_arn,
            bytes = request.message.len(),
            "Recorded publish"
        );
        self.published
            .entry(request.target_arn.clone())
            .or_default()
            .push(request);
        Ok(())
    }
}

/// Registry holding endpoints per platform application
#[derive(Default)]
pub struct MemoryRegistry {
    applications: DashMap<String, Vec<Endpoint>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint under a platform application
    pub fn register(&self, application_arn: impl Into<String>, endpoint: Endpoint) {
        self.applications
            .entry(application_arn.into())
            .or_default()
            .push(endpoint);
    }
}

#[async_trait]
impl DeviceRegistry for MemoryRegistry {
    async fn endpoints(&self, application_arn: &str) -> Result<Vec<Endpoint>, RelayError> {
        Ok(self
            .applications
            .get(application_arn)
            .map(|endpoints| endpoints.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::MESSAGE_STRUCTURE_JSON;
    use std::collections::BTreeMap;

    fn request(target: &str) -> PublishRequest {
        PublishRequest {
            target_arn: target.to_string(),
            message: r#"{"default":"hi"}"#.to_string(),
            message_structure: MESSAGE_STRUCTURE_JSON.to_string(),
            message_attributes: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_records_publishes() {
        let relay = MemoryRelay::new();

        relay.publish(request("arn:1")).await.unwrap();
        relay.publish(request("arn:1")).await.unwrap();
        relay.publish(request("arn:2")).await.unwrap();

        assert_eq!(relay.published_to("arn:1").len(), 2);
        assert_eq!(relay.published_to("arn:3").len(), 0);
        assert_eq!(relay.total_published(), 3);
    }

    #[tokio::test]
    async fn test_failing_endpoint() {
        let relay = MemoryRelay::new();
        relay.fail_endpoint("arn:bad");

        let result = relay.publish(request("arn:bad")).await;
        assert!(matches!(result, Err(RelayError::Publish(_))));
        assert_eq!(relay.total_published(), 0);
    }

    #[test]
    fn test_registry_lists_endpoints() {
        let registry = MemoryRegistry::new();
        registry.register("app:apns", Endpoint::new("arn:1", true));
        registry.register("app:apns", Endpoint::new("arn:2", false));

        let endpoints = tokio_test::block_on(registry.endpoints("app:apns")).unwrap();
        assert_eq!(endpoints.len(), 2);
        assert!(!endpoints[1].enabled);

        assert!(tokio_test::block_on(registry.endpoints("app:gcm"))
            .unwrap()
            .is_empty());
    }
}
