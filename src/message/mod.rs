//! Push message model and multi-platform encoding.
//!
//! This module provides:
//! - `Message`, the platform-agnostic notification descriptor
//! - Per-platform encoders for APNS, APNS VoIP, FCM, GCM and ADM that enforce
//!   each platform's byte budget, trimming the body text once when needed
//! - `PushEnvelope`, the channel-keyed multi-payload document the relay consumes
//! - `deep_merge`, used to layer custom and platform override data on the
//!   generated payloads
//!
//! # Example
//!
//! ```ignore
//! let mut message = Message::new("Your order has shipped");
//! message.set_badge(1).set_collapse_key(Some("orders"));
//!
//! let envelope = message.serialize()?;
//! assert_eq!(envelope.default_text(), Some("Your order has shipped"));
//!
//! // Published as the relay message body
//! let body = envelope.to_json();
//! ```

pub mod encoder;
mod envelope;
mod error;
pub mod merge;
#[allow(clippy::module_inception)]
mod message;
mod types;

pub use envelope::{PushEnvelope, DEFAULT_CHANNEL};
pub use error::{MessageError, MessageResult};
pub use merge::deep_merge;
pub use message::{Message, MessageRequest};
pub use types::{
    ApnsSound, CollapseKey, Platform, Priority, PushType, ADM_MAX_LENGTH, APNS_MAX_LENGTH,
    APNS_VOIP_MAX_LENGTH, FCM_MAX_LENGTH, GCM_MAX_LENGTH, NO_COLLAPSE,
};
