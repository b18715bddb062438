//! The event shape projections consume.

use chrono::{DateTime, Utc};
use common::{AggregateId, EventId, Version};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ProjectionError, Result};

/// An immutable domain fact to be applied to read models.
///
/// Within one aggregate, events must reach a projection in non-decreasing
/// `aggregate_version` order. That ordering is the event source's contract;
/// nothing here enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedEvent {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// Discriminator projections switch on (e.g., "UserCreated").
    pub event_type: String,

    /// The aggregate this event belongs to.
    pub aggregate_id: AggregateId,

    /// The aggregate's version after this event.
    pub aggregate_version: Version,

    /// When the domain fact happened (not when it was processed).
    pub occurred_at: DateTime<Utc>,

    /// Event data; its shape depends on `event_type`.
    pub payload: serde_json::Value,
}

impl ProjectedEvent {
    /// Creates a new event builder.
    pub fn builder() -> ProjectedEventBuilder {
        ProjectedEventBuilder::default()
    }

    /// Decodes the payload into a concrete type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    /// Milliseconds between `occurred_at` and `now`, clamped at zero.
    pub fn lag_ms(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.occurred_at).num_milliseconds()).unwrap_or(0)
    }
}

/// Builder for [`ProjectedEvent`].
#[derive(Debug, Default)]
pub struct ProjectedEventBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    aggregate_id: Option<AggregateId>,
    aggregate_version: Option<Version>,
    occurred_at: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
}

impl ProjectedEventBuilder {
    /// Sets the event ID. If not set, a new ID will be generated.
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Sets the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the aggregate ID.
    pub fn aggregate_id(mut self, id: impl Into<AggregateId>) -> Self {
        self.aggregate_id = Some(id.into());
        self
    }

    /// Sets the aggregate version.
    pub fn aggregate_version(mut self, version: Version) -> Self {
        self.aggregate_version = Some(version);
        self
    }

    /// Sets the occurrence time. If not set, the current time will be used.
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Builds the event.
    ///
    /// Fails with [`ProjectionError::InvalidEvent`] when `event_type`,
    /// `aggregate_id` or `aggregate_version` is missing. A missing payload
    /// becomes JSON `null`.
    pub fn build(self) -> Result<ProjectedEvent> {
        Ok(ProjectedEvent {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self
                .event_type
                .ok_or(ProjectionError::InvalidEvent("event_type"))?,
            aggregate_id: self
                .aggregate_id
                .ok_or(ProjectionError::InvalidEvent("aggregate_id"))?,
            aggregate_version: self
                .aggregate_version
                .ok_or(ProjectionError::InvalidEvent("aggregate_version"))?,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            payload: self.payload.unwrap_or(serde_json::Value::Null),
        })
    }
}
