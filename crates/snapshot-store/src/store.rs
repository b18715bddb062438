use async_trait::async_trait;

use crate::{AggregateId, Result, Snapshot, Version};

/// Persistence port for aggregate snapshots.
///
/// Several snapshots of the same aggregate may coexist at different versions.
/// Implementations must hand out independent copies: mutating a returned
/// snapshot never changes what the store holds.
#[async_trait]
pub trait SnapshotStore<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Stores a snapshot alongside any existing ones for the same aggregate.
    ///
    /// A snapshot at a version that is already stored replaces it.
    async fn save(&self, snapshot: Snapshot<S>) -> Result<()>;

    /// Returns the snapshot with the highest version for the aggregate.
    async fn find_latest(&self, aggregate_id: &AggregateId) -> Result<Option<Snapshot<S>>>;

    /// Returns the snapshot taken at exactly `version`.
    async fn find_by_version(
        &self,
        aggregate_id: &AggregateId,
        version: Version,
    ) -> Result<Option<Snapshot<S>>>;

    /// Removes every snapshot of the aggregate. Unknown aggregates are a no-op.
    async fn delete(&self, aggregate_id: &AggregateId) -> Result<()>;
}
