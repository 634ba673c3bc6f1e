//! Prometheus metrics for push publishing.
//!
//! - Publish metrics (published, failed)
//! - Encoding metrics (messages rejected as too long)
//! - Broadcast metrics (disabled endpoints skipped)

mod helpers;

pub use helpers::{encode_metrics, PushMetrics};

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "push_relay";

lazy_static! {
    /// Total envelopes handed to the relay
    pub static ref PUSH_PUBLISHED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_published_total", METRIC_PREFIX),
        "Total messages published to the relay"
    ).unwrap();

    /// Total publishes the relay rejected
    pub static ref PUSH_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_failed_total", METRIC_PREFIX),
        "Total publishes that failed at the relay"
    ).unwrap();

    /// Messages that could not be fitted into a platform budget
    pub static ref PUSH_TOO_LONG_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_too_long_total", METRIC_PREFIX),
        "Total messages rejected for exceeding a platform length limit",
        &["platform"]
    ).unwrap();

    /// Disabled endpoints skipped during broadcasts
    pub static ref PUSH_DISABLED_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_disabled_skipped_total", METRIC_PREFIX),
        "Total disabled endpoints skipped while broadcasting"
    ).unwrap();
}
