//! Read model and read model store ports.

use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;

use crate::Result;

/// One materialized row of a query-side view.
///
/// Each projection defines its own concrete row type; the only requirement
/// is a stable identity the store can key it by.
pub trait ReadModel: Clone + Send + Sync + 'static {
    /// The identity type rows are keyed by.
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Returns this row's identity.
    fn id(&self) -> Self::Id;
}

/// Keyed persistence of read models.
///
/// `save` is an upsert keyed by [`ReadModel::id`]. Reads hand out independent
/// copies: mutating a returned model never affects what the store holds.
#[async_trait]
pub trait ReadModelStore: Send + Sync {
    /// The row type this store holds.
    type Model: ReadModel;

    /// Inserts or overwrites the model under its identity.
    async fn save(&self, model: Self::Model) -> Result<()>;

    /// Point lookup. A missing row is `None`, not an error.
    async fn find_by_id(
        &self,
        id: &<Self::Model as ReadModel>::Id,
    ) -> Result<Option<Self::Model>>;

    /// Every stored row, in no particular order.
    async fn find_all(&self) -> Result<Vec<Self::Model>>;

    /// Removes the row. Deleting a missing row is a no-op.
    async fn delete(&self, id: &<Self::Model as ReadModel>::Id) -> Result<()>;

    /// Removes every row.
    async fn clear(&self) -> Result<()>;

    /// Number of stored rows.
    async fn count(&self) -> Result<usize>;
}
