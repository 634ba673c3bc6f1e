//! Publishing service.
//!
//! `Messages` turns a `Message` into a relay publish: it encodes the
//! multi-payload envelope, attaches delivery hints (push type, collapse id)
//! as relay attributes, and sends it to a single endpoint or to every enabled
//! endpoint of the configured platform applications.
//!
//! With `push.debug` enabled nothing is published; the encoded message is
//! logged instead.

mod messages;

pub use messages::{BroadcastReport, Messages, COLLAPSE_ID_ATTRIBUTE, PUSH_TYPE_ATTRIBUTE};
