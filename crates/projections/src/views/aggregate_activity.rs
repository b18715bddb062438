//! Aggregate activity read model: event counts per aggregate, any event type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, Version};

use crate::Result;
use crate::event::ProjectedEvent;
use crate::memory::InMemoryReadModelStore;
use crate::projection::Projection;
use crate::read_model::{ReadModel, ReadModelStore};

/// Activity summary for one aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateActivity {
    pub aggregate_id: AggregateId,
    pub event_count: u64,
    pub last_version: Version,
    pub last_event_type: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl ReadModel for AggregateActivity {
    type Id = AggregateId;

    fn id(&self) -> AggregateId {
        self.aggregate_id.clone()
    }
}

/// Counts events per aggregate.
#[derive(Clone, Default)]
pub struct AggregateActivityView {
    store: InMemoryReadModelStore<AggregateActivity>,
}

impl AggregateActivityView {
    /// Creates a new empty activity view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the activity of one aggregate.
    pub async fn get_activity(&self, id: &AggregateId) -> Result<Option<AggregateActivity>> {
        self.store.find_by_id(id).await
    }

    /// The `limit` aggregates with the most events, busiest first.
    pub async fn busiest(&self, limit: usize) -> Result<Vec<AggregateActivity>> {
        let mut all = self.store.find_all().await?;
        all.sort_by(|a, b| {
            b.event_count
                .cmp(&a.event_count)
                .then_with(|| a.aggregate_id.cmp(&b.aggregate_id))
        });
        all.truncate(limit);
        Ok(all)
    }

    /// Number of distinct aggregates seen.
    pub async fn aggregate_count(&self) -> Result<usize> {
        self.store.count().await
    }
}

#[async_trait]
impl Projection for AggregateActivityView {
    fn name(&self) -> &str {
        "aggregate_activity"
    }

    async fn project(&self, event: &ProjectedEvent) -> Result<()> {
        let activity = match self.store.find_by_id(&event.aggregate_id).await? {
            Some(existing) if existing.last_version >= event.aggregate_version => return Ok(()),
            Some(mut existing) => {
                existing.event_count += 1;
                existing.last_version = event.aggregate_version;
                existing.last_event_type = event.event_type.clone();
                existing.last_seen = event.occurred_at;
                existing
            }
            None => AggregateActivity {
                aggregate_id: event.aggregate_id.clone(),
                event_count: 1,
                last_version: event.aggregate_version,
                last_event_type: event.event_type.clone(),
                first_seen: event.occurred_at,
                last_seen: event.occurred_at,
            },
        };
        self.store.save(activity).await
    }

    async fn reset(&self) -> Result<()> {
        self.store.clear().await
    }
}
