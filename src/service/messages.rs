use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;

use crate::config::PushConfig;
use crate::error::{AppError, Result};
use crate::message::{Message, Platform};
use crate::metrics::PushMetrics;
use crate::relay::{
    DeviceRegistry, MessageAttribute, PublishRequest, PushRelay, RelayError,
    MESSAGE_STRUCTURE_JSON,
};

/// Relay attribute carrying the APNS push type
pub const PUSH_TYPE_ATTRIBUTE: &str = "AWS.SNS.MOBILE.APNS.PUSH_TYPE";

/// Relay attribute carrying the collapse id
pub const COLLAPSE_ID_ATTRIBUTE: &str = "AWS.SNS.MOBILE.APNS.COLLAPSE_ID";

/// Outcome of a broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Endpoints the relay accepted the message for
    pub delivered: usize,
    /// Endpoints whose publish failed
    pub failed: usize,
    /// Disabled endpoints that were not published to
    pub skipped: usize,
}

impl BroadcastReport {
    fn absorb(&mut self, other: BroadcastReport) {
        self.delivered += other.delivered;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Encodes messages and publishes them through the relay
pub struct Messages {
    relay: Arc<dyn PushRelay>,
    registry: Arc<dyn DeviceRegistry>,
    config: PushConfig,
}

impl Messages {
    pub fn new(
        relay: Arc<dyn PushRelay>,
        registry: Arc<dyn DeviceRegistry>,
        config: PushConfig,
    ) -> Self {
        for tag in config.unknown_platforms() {
            tracing::warn!(platform = %tag, "Ignoring application ARN for unknown platform");
        }

        Self {
            relay,
            registry,
            config,
        }
    }

    /// Whether messages are logged instead of published
    pub fn is_debug(&self) -> bool {
        self.config.debug
    }

    /// Send a message to one endpoint
    pub async fn send(&self, message: &Message, endpoint_arn: &str) -> Result<()> {
        let request = self.prepare(message, endpoint_arn)?;

        if self.config.debug {
            tracing::info!(
                endpoint_arn = %endpoint_arn,
                message = %request.message,
                "Message would have been sent"
            );
            return Ok(());
        }

        match self.relay.publish(request).await {
            Ok(()) => {
                PushMetrics::record_published();
                Ok(())
            }
            Err(e) => {
                PushMetrics::record_failed();
                Err(e.into())
            }
        }
    }

    /// Send plain text to one endpoint
    pub async fn send_text(&self, text: &str, endpoint_arn: &str) -> Result<()> {
        self.send(&Message::new(text), endpoint_arn).await
    }

    /// Send a message to every enabled endpoint of one platform, or of all configured platforms
    ///
    /// Failures for individual endpoints are logged and counted; only
    /// configuration, encoding and registry errors abort the broadcast.
    pub async fn broadcast(
        &self,
        message: &Message,
        platform: Option<Platform>,
    ) -> Result<BroadcastReport> {
        let applications: Vec<(Platform, String)> = match platform {
            Some(platform) => {
                let arn = self
                    .config
                    .application_arn(platform)
                    .ok_or_else(|| AppError::PlatformNotConfigured(platform.to_string()))?;
                vec![(platform, arn.to_string())]
            }
            None => self
                .config
                .applications()
                .into_iter()
                .map(|(platform, arn)| (platform, arn.to_string()))
                .collect(),
        };

        let mut report = BroadcastReport::default();
        for (platform, application_arn) in applications {
            let platform_report = self
                .broadcast_to_platform(message, platform, &application_arn)
                .await?;
            report.absorb(platform_report);
        }

        tracing::info!(
            delivered = report.delivered,
            failed = report.failed,
            skipped = report.skipped,
            "Broadcast complete"
        );
        Ok(report)
    }

    async fn broadcast_to_platform(
        &self,
        message: &Message,
        platform: Platform,
        application_arn: &str,
    ) -> Result<BroadcastReport> {
        let message = restrict_to_platform(message, platform);
        let template = self.prepare(&message, application_arn)?;

        if self.config.debug {
            tracing::info!(
                platform = %platform,
                message = %template.message,
                "Message would have been sent to platform"
            );
            return Ok(BroadcastReport::default());
        }

        let endpoints = self.registry.endpoints(application_arn).await?;
        let max_in_flight = self.config.max_concurrent_sends.max(1);

        let mut report = BroadcastReport::default();
        let mut futures = FuturesUnordered::new();

        for endpoint in endpoints {
            if !endpoint.enabled {
                tracing::info!(endpoint_arn = %endpoint.arn, "Disabled endpoint");
                PushMetrics::record_disabled_skipped();
                report.skipped += 1;
                continue;
            }

            let relay = self.relay.clone();
            let request = PublishRequest {
                target_arn: endpoint.arn,
                ..template.clone()
            };
            futures.push(async move {
                let target = request.target_arn.clone();
                (target, relay.publish(request).await)
            });

            // Process completed publishes when we hit the concurrency limit
            while futures.len() >= max_in_flight {
                match futures.next().await {
                    Some((target, result)) => record_publish(&mut report, &target, result),
                    None => break,
                }
            }
        }

        while let Some((target, result)) = futures.next().await {
            record_publish(&mut report, &target, result);
        }

        tracing::debug!(
            platform = %platform,
            delivered = report.delivered,
            failed = report.failed,
            "Platform broadcast complete"
        );
        Ok(report)
    }

    /// Encode the message and attach its delivery hints
    fn prepare(&self, message: &Message, target_arn: &str) -> Result<PublishRequest> {
        let envelope = message.serialize().map_err(|e| {
            PushMetrics::record_too_long(e.platform());
            e
        })?;

        let mut attributes = BTreeMap::new();
        attributes.insert(
            PUSH_TYPE_ATTRIBUTE.to_string(),
            MessageAttribute::string(message.push_type().as_str()),
        );
        if message.collapse_key().is_collapsible() {
            attributes.insert(
                COLLAPSE_ID_ATTRIBUTE.to_string(),
                MessageAttribute::string(message.collapse_key().as_str()),
            );
        }

        Ok(PublishRequest {
            target_arn: target_arn.to_string(),
            message: envelope.to_json(),
            message_structure: MESSAGE_STRUCTURE_JSON.to_string(),
            message_attributes: attributes,
        })
    }
}

/// Render only the broadcast platform unless the caller chose platforms explicitly
fn restrict_to_platform(message: &Message, platform: Platform) -> Cow<'_, Message> {
    if message.is_platforms_customized() {
        return Cow::Borrowed(message);
    }
    let mut message = message.clone();
    message.set_platforms([platform]);
    Cow::Owned(message)
}

fn record_publish(
    report: &mut BroadcastReport,
    target: &str,
    result: std::result::Result<(), RelayError>,
) {
    match result {
        Ok(()) => {
            PushMetrics::record_published();
            report.delivered += 1;
        }
        Err(e) => {
            PushMetrics::record_failed();
            report.failed += 1;
            tracing::error!(endpoint_arn = %target, error = %e, "Failed to push");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{Endpoint, MemoryRegistry, MemoryRelay};

    fn config(debug: bool) -> PushConfig {
        let mut config = PushConfig {
            debug,
            ..PushConfig::default()
        };
        config
            .platforms
            .insert("apns".to_string(), "app:apns".to_string());
        config
            .platforms
            .insert("gcm".to_string(), "app:gcm".to_string());
        config
    }

    fn service(debug: bool) -> (Messages, Arc<MemoryRelay>, Arc<MemoryRegistry>) {
        let relay = Arc::new(MemoryRelay::new());
        let registry = Arc::new(MemoryRegistry::new());
        let messages = Messages::new(relay.clone(), registry.clone(), config(debug));
        (messages, relay, registry)
    }

    #[tokio::test]
    async fn test_send_publishes_envelope() {
        let (messages, relay, _) = service(false);

        messages.send_text("hello", "arn:device/1").await.unwrap();

        let published = relay.published_to("arn:device/1");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].message_structure, "json");

        let envelope: serde_json::Value = serde_json::from_str(&published[0].message).unwrap();
        assert_eq!(envelope["default"], "hello");
        assert!(envelope["APNS"].is_string());
    }

    #[tokio::test]
    async fn test_send_attributes() {
        let (messages, relay, _) = service(false);

        let mut message = Message::new("hello");
        message.set_content_available(true).set_collapse_key(Some("sync"));
        messages.send(&message, "arn:device/1").await.unwrap();

        let attributes = &relay.published_to("arn:device/1")[0].message_attributes;
        assert_eq!(attributes[PUSH_TYPE_ATTRIBUTE].string_value, "background");
        assert_eq!(attributes[COLLAPSE_ID_ATTRIBUTE].string_value, "sync");
    }

    #[tokio::test]
    async fn test_no_collapse_attribute_for_sentinel() {
        let (messages, relay, _) = service(false);

        messages.send_text("hello", "arn:device/1").await.unwrap();

        let attributes = &relay.published_to("arn:device/1")[0].message_attributes;
        assert!(!attributes.contains_key(COLLAPSE_ID_ATTRIBUTE));
        assert_eq!(attributes[PUSH_TYPE_ATTRIBUTE].string_value, "alert");
    }

    #[tokio::test]
    async fn test_debug_mode_publishes_nothing() {
        let (messages, relay, registry) = service(true);
        registry.register("app:apns", Endpoint::new("arn:device/1", true));

        messages.send_text("hello", "arn:device/1").await.unwrap();
        let report = messages.broadcast(&Message::new("hello"), None).await.unwrap();

        assert!(messages.is_debug());
        assert_eq!(report, BroadcastReport::default());
        assert_eq!(relay.total_published(), 0);
    }

    #[tokio::test]
    async fn test_send_too_long_is_rejected() {
        let (messages, relay, _) = service(false);

        let mut message = Message::new("x".repeat(10_000));
        message.set_allow_trimming(false);

        let err = messages.send(&message, "arn:device/1").await.unwrap_err();
        assert!(err.is_rejected_message());
        assert_eq!(relay.total_published(), 0);
    }

    #[tokio::test]
    async fn test_send_relay_failure() {
        let (messages, relay, _) = service(false);
        relay.fail_endpoint("arn:device/1");

        let err = messages.send_text("hello", "arn:device/1").await.unwrap_err();
        assert!(matches!(err, AppError::Relay(_)));
    }

    #[tokio::test]
    async fn test_broadcast_unknown_platform() {
        let (messages, _, _) = service(false);

        let err = messages
            .broadcast(&Message::new("hello"), Some(Platform::Adm))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PlatformNotConfigured(_)));
    }

    #[tokio::test]
    async fn test_broadcast_skips_disabled_and_counts_failures() {
        let (messages, relay, registry) = service(false);
        registry.register("app:apns", Endpoint::new("arn:ios/1", true));
        registry.register("app:apns", Endpoint::new("arn:ios/2", false));
        registry.register("app:apns", Endpoint::new("arn:ios/3", true));
        registry.register("app:gcm", Endpoint::new("arn:android/1", true));
        relay.fail_endpoint("arn:ios/3");

        let report = messages.broadcast(&Message::new("hello"), None).await.unwrap();

        assert_eq!(
            report,
            BroadcastReport {
                delivered: 2,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(relay.published_to("arn:ios/1").len(), 1);
        assert!(relay.published_to("arn:ios/2").is_empty());
        assert_eq!(relay.published_to("arn:android/1").len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_restricts_default_platforms() {
        let (messages, relay, registry) = service(false);
        registry.register("app:gcm", Endpoint::new("arn:android/1", true));

        messages
            .broadcast(&Message::new("hello"), Some(Platform::Gcm))
            .await
            .unwrap();

        let published = relay.published_to("arn:android/1");
        let envelope: serde_json::Value = serde_json::from_str(&published[0].message).unwrap();
        let channels: Vec<_> = envelope.as_object().unwrap().keys().cloned().collect();
        assert_eq!(channels, vec!["default", "GCM"]);
    }

    #[tokio::test]
    async fn test_broadcast_keeps_customized_platforms() {
        let (messages, relay, registry) = service(false);
        registry.register("app:gcm", Endpoint::new("arn:android/1", true));

        let mut message = Message::new("hello");
        message.set_platforms([Platform::Apns, Platform::Gcm]);
        messages.broadcast(&message, Some(Platform::Gcm)).await.unwrap();

        let published = relay.published_to("arn:android/1");
        let envelope: serde_json::Value = serde_json::from_str(&published[0].message).unwrap();
        assert!(envelope.get("APNS").is_some());
        assert!(envelope.get("GCM").is_some());
    }

    #[tokio::test]
    async fn test_broadcast_bounded_concurrency() {
        let relay = Arc::new(MemoryRelay::new());
        let registry = Arc::new(MemoryRegistry::new());
        let config = PushConfig {
            max_concurrent_sends: 2,
            ..config(false)
        };
        for i in 0..7 {
            registry.register("app:apns", Endpoint::new(format!("arn:ios/{i}"), true));
        }
        let messages = Messages::new(relay.clone(), registry, config);

        let report = messages
            .broadcast(&Message::new("hello"), Some(Platform::Apns))
            .await
            .unwrap();

        assert_eq!(report.delivered, 7);
        assert_eq!(relay.total_published(), 7);
    }
}
