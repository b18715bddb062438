//! Shared identity and sequence types.

pub mod types;

pub use types::{AggregateId, EventId, Version};
