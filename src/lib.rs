// Infrastructure (shared components)
pub mod config;
pub mod error;
pub mod metrics;

// Domain layer
pub mod message;
pub mod topic;

// Delivery layer
pub mod relay;
pub mod service;
