use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{AggregateId, Result, Snapshot, SnapshotStore, Version};

type VersionedSnapshots<S> = BTreeMap<Version, Snapshot<S>>;

/// In-memory snapshot store.
///
/// Snapshots are kept per aggregate in a version-ordered map, so the latest
/// snapshot is found regardless of the order they were saved in. Cloning the
/// store shares the underlying storage.
#[derive(Clone)]
pub struct InMemorySnapshotStore<S> {
    snapshots: Arc<RwLock<HashMap<AggregateId, VersionedSnapshots<S>>>>,
}

impl<S> InMemorySnapshotStore<S> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns how many snapshots are held for an aggregate.
    pub async fn snapshot_count(&self, aggregate_id: &AggregateId) -> usize {
        self.snapshots
            .read()
            .await
            .get(aggregate_id)
            .map_or(0, BTreeMap::len)
    }

    /// Drops every snapshot of every aggregate.
    pub async fn clear(&self) {
        self.snapshots.write().await.clear();
    }
}

impl<S> Default for InMemorySnapshotStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> SnapshotStore<S> for InMemorySnapshotStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn save(&self, snapshot: Snapshot<S>) -> Result<()> {
        tracing::debug!(
            aggregate_id = %snapshot.aggregate_id,
            version = %snapshot.version,
            "saving snapshot"
        );

        self.snapshots
            .write()
            .await
            .entry(snapshot.aggregate_id.clone())
            .or_default()
            .insert(snapshot.version, snapshot);

        metrics::counter!("snapshots_saved").increment(1);
        Ok(())
    }

    async fn find_latest(&self, aggregate_id: &AggregateId) -> Result<Option<Snapshot<S>>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(aggregate_id)
            .and_then(|versions| versions.last_key_value())
            .map(|(_, snapshot)| snapshot.clone()))
    }

    async fn find_by_version(
        &self,
        aggregate_id: &AggregateId,
        version: Version,
    ) -> Result<Option<Snapshot<S>>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(aggregate_id)
            .and_then(|versions| versions.get(&version))
            .cloned())
    }

    async fn delete(&self, aggregate_id: &AggregateId) -> Result<()> {
        if let Some(removed) = self.snapshots.write().await.remove(aggregate_id) {
            tracing::debug!(
                aggregate_id = %aggregate_id,
                removed = removed.len(),
                "deleted snapshots"
            );
        }
        Ok(())
    }
}
