//! Point-in-time captures of aggregate state.
//!
//! - [`Snapshot`] holds an aggregate's state as of a [`Version`]
//! - [`SnapshotStore`] is the persistence port; several snapshots per aggregate may coexist
//! - [`InMemorySnapshotStore`] is the in-process implementation
//! - [`should_take_snapshot`] and [`SnapshotPolicy`] decide when a new snapshot is due

pub mod error;
pub mod memory;
pub mod policy;
pub mod snapshot;
pub mod store;

pub use common::{AggregateId, Version};
pub use error::{Result, SnapshotError};
pub use memory::InMemorySnapshotStore;
pub use policy::{DEFAULT_SNAPSHOT_INTERVAL, SnapshotPolicy, should_take_snapshot};
pub use snapshot::Snapshot;
pub use store::SnapshotStore;
