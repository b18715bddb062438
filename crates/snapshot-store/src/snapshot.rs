use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{AggregateId, Result, Version};

/// An aggregate's state as of a specific version.
///
/// Replay logic loads the latest snapshot and applies only the events after
/// `version`, instead of the aggregate's full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<S> {
    /// The aggregate this snapshot belongs to.
    pub aggregate_id: AggregateId,

    /// The aggregate version the state reflects.
    pub version: Version,

    /// The captured state.
    pub state: S,

    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
}

impl<S> Snapshot<S> {
    /// Creates a snapshot stamped with the current time.
    pub fn new(aggregate_id: AggregateId, version: Version, state: S) -> Self {
        Self {
            aggregate_id,
            version,
            state,
            taken_at: Utc::now(),
        }
    }

    /// Overrides the capture timestamp.
    pub fn with_taken_at(mut self, taken_at: DateTime<Utc>) -> Self {
        self.taken_at = taken_at;
        self
    }

    /// Transforms the state while keeping identity, version and timestamp.
    pub fn map_state<T>(self, f: impl FnOnce(S) -> T) -> Snapshot<T> {
        Snapshot {
            aggregate_id: self.aggregate_id,
            version: self.version,
            state: f(self.state),
            taken_at: self.taken_at,
        }
    }
}

impl<S: Serialize> Snapshot<S> {
    /// Encodes the state as JSON, for stores that persist untyped documents.
    pub fn encode(&self) -> Result<Snapshot<serde_json::Value>> {
        Ok(Snapshot {
            aggregate_id: self.aggregate_id.clone(),
            version: self.version,
            state: serde_json::to_value(&self.state)?,
            taken_at: self.taken_at,
        })
    }
}

impl Snapshot<serde_json::Value> {
    /// Decodes a JSON snapshot into a concrete state type.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Snapshot<T>> {
        Ok(Snapshot {
            aggregate_id: self.aggregate_id,
            version: self.version,
            state: serde_json::from_value(self.state)?,
            taken_at: self.taken_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Counter {
        value: i32,
        label: String,
    }

    #[test]
    fn new_snapshot_carries_identity_and_version() {
        let id = AggregateId::new("counter-1");
        let snapshot = Snapshot::new(id.clone(), Version::new(5), 42);

        assert_eq!(snapshot.aggregate_id, id);
        assert_eq!(snapshot.version, Version::new(5));
        assert_eq!(snapshot.state, 42);
        assert!(snapshot.taken_at <= Utc::now());
    }

    #[test]
    fn encode_then_decode_restores_typed_state() {
        let original = Counter {
            value: 42,
            label: "test".to_string(),
        };
        let snapshot = Snapshot::new(AggregateId::new("c"), Version::new(10), original.clone());

        let encoded = snapshot.encode().unwrap();
        assert_eq!(encoded.state["value"], 42);

        let decoded: Snapshot<Counter> = encoded.decode().unwrap();
        assert_eq!(decoded.state, original);
        assert_eq!(decoded.version, Version::new(10));
        assert_eq!(decoded.taken_at, snapshot.taken_at);
    }

    #[test]
    fn decode_rejects_mismatched_state() {
        let snapshot = Snapshot::new(
            AggregateId::new("c"),
            Version::new(1),
            serde_json::json!({"unexpected": true}),
        );
        let err = snapshot.decode::<Counter>().unwrap_err();
        assert!(matches!(err, crate::SnapshotError::Serialization(_)));
    }

    #[test]
    fn map_state_keeps_metadata() {
        let snapshot = Snapshot::new(AggregateId::new("c"), Version::new(3), 2);
        let taken_at = snapshot.taken_at;
        let doubled = snapshot.map_state(|v| v * 2);
        assert_eq!(doubled.state, 4);
        assert_eq!(doubled.version, Version::new(3));
        assert_eq!(doubled.taken_at, taken_at);
    }
}
