//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::message::Platform;

use super::{
    PUSH_DISABLED_SKIPPED_TOTAL, PUSH_FAILED_TOTAL, PUSH_PUBLISHED_TOTAL, PUSH_TOO_LONG_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording push metrics
pub struct PushMetrics;

impl PushMetrics {
    pub fn record_published() {
        PUSH_PUBLISHED_TOTAL.inc();
    }

    pub fn record_failed() {
        PUSH_FAILED_TOTAL.inc();
    }

    /// Record a message rejected for one platform's length limit
    pub fn record_too_long(platform: Platform) {
        PUSH_TOO_LONG_TOTAL
            .with_label_values(&[platform.as_str()])
            .inc();
    }

    pub fn record_disabled_skipped() {
        PUSH_DISABLED_SKIPPED_TOTAL.inc();
    }
}
