//! Core projection trait.

use async_trait::async_trait;

use crate::Result;
use crate::event::ProjectedEvent;

/// Folds events into the read models of one store it owns.
///
/// The same projection serves live application (`project` one event at a
/// time) and rebuilds (`reset`, then `project` every event in order).
/// Callers must not overlap `project` calls on one instance; the
/// [`ProjectionRebuildManager`](crate::ProjectionRebuildManager) serializes
/// them per projection.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Stable name, unique within a rebuild manager's registry.
    fn name(&self) -> &str;

    /// Applies one event to the owned store.
    ///
    /// Event types the projection does not care about are a no-op.
    async fn project(&self, event: &ProjectedEvent) -> Result<()>;

    /// Clears all materialized state, returning to the pre-any-event state.
    ///
    /// Safe to call repeatedly and before any event was applied.
    async fn reset(&self) -> Result<()>;
}
