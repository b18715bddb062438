//! Read models and projections for the CQRS query side.
//!
//! This crate provides:
//! - [`ProjectedEvent`], the ordered domain facts projections consume
//! - [`ReadModel`] and the [`ReadModelStore`] port, with [`InMemoryReadModelStore`]
//! - [`Projection`] trait for folding events into a store it owns
//! - [`ProjectionRebuildManager`] for named registration, rebuilds and live application
//! - Two views: user profiles and per-aggregate activity

pub mod error;
pub mod event;
pub mod memory;
pub mod projection;
pub mod read_model;
pub mod rebuild;
pub mod views;

pub use common::{AggregateId, EventId, Version};
pub use error::{ProjectionError, Result};
pub use event::{ProjectedEvent, ProjectedEventBuilder};
pub use memory::InMemoryReadModelStore;
pub use projection::Projection;
pub use read_model::{ReadModel, ReadModelStore};
pub use rebuild::{ProjectionRebuildManager, RebuildResult};
pub use views::{AggregateActivity, AggregateActivityView, UserProfile, UserProfileView};
