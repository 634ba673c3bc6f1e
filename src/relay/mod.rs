//! Notification relay and device registry seams.
//!
//! - `PushRelay`: publishes an encoded envelope to a device endpoint
//! - `DeviceRegistry`: lists endpoints per platform application
//! - `MemoryRelay` / `MemoryRegistry`: in-memory implementations

mod backend;
mod memory;

pub use backend::{
    DeviceRegistry, Endpoint, MessageAttribute, PublishRequest, PushRelay, RelayError,
    MESSAGE_STRUCTURE_JSON,
};
pub use memory::{MemoryRegistry, MemoryRelay};
