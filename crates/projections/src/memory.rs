//! In-memory read model store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::read_model::{ReadModel, ReadModelStore};

/// Read model store backed by a `HashMap`.
///
/// Cloning the store shares the same underlying table, so a projection and
/// its query side can hold the same store.
#[derive(Clone)]
pub struct InMemoryReadModelStore<M: ReadModel> {
    rows: Arc<RwLock<HashMap<M::Id, M>>>,
}

impl<M: ReadModel> InMemoryReadModelStore<M> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Rows matching `predicate`, copied out.
    pub async fn find_where(&self, predicate: impl Fn(&M) -> bool) -> Vec<M> {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }
}

impl<M: ReadModel> Default for InMemoryReadModelStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: ReadModel> ReadModelStore for InMemoryReadModelStore<M> {
    type Model = M;

    async fn save(&self, model: M) -> Result<()> {
        self.rows.write().await.insert(model.id(), model);
        Ok(())
    }

    async fn find_by_id(&self, id: &M::Id) -> Result<Option<M>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<M>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn delete(&self, id: &M::Id) -> Result<()> {
        self.rows.write().await.remove(id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut rows = self.rows.write().await;
        tracing::debug!(rows = rows.len(), "clearing read model store");
        rows.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.rows.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        tags: Vec<String>,
        version: i64,
    }

    impl ReadModel for Row {
        type Id = String;

        fn id(&self) -> String {
            self.id.clone()
        }
    }

    fn row(id: &str, version: i64) -> Row {
        Row {
            id: id.to_string(),
            tags: vec!["a".to_string()],
            version,
        }
    }

    #[tokio::test]
    async fn save_is_an_upsert() {
        let store = InMemoryReadModelStore::new();
        store.save(row("r1", 1)).await.unwrap();
        store.save(row("r1", 2)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let found = store.find_by_id(&"r1".to_string()).await.unwrap().unwrap();
        assert_eq!(found.version, 2);
    }

    #[tokio::test]
    async fn missing_row_is_none() {
        let store: InMemoryReadModelStore<Row> = InMemoryReadModelStore::new();
        assert!(store.find_by_id(&"nope".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryReadModelStore::new();
        store.save(row("r1", 1)).await.unwrap();

        store.delete(&"r1".to_string()).await.unwrap();
        store.delete(&"r1".to_string()).await.unwrap();
        store.delete(&"never".to_string()).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_all_and_clear() {
        let store = InMemoryReadModelStore::new();
        store.save(row("r1", 1)).await.unwrap();
        store.save(row("r2", 1)).await.unwrap();

        let mut ids: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["r1", "r2"]);

        store.clear().await.unwrap();
        assert!(store.find_all().await.unwrap().is_empty());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn reads_return_independent_copies() {
        let store = InMemoryReadModelStore::new();
        store.save(row("r1", 1)).await.unwrap();

        let mut single = store.find_by_id(&"r1".to_string()).await.unwrap().unwrap();
        single.tags.push("mutated".to_string());
        single.version = 99;

        let mut all = store.find_all().await.unwrap();
        all[0].tags.clear();

        let fresh = store.find_by_id(&"r1".to_string()).await.unwrap().unwrap();
        assert_eq!(fresh, row("r1", 1));
    }

    #[tokio::test]
    async fn find_where_filters() {
        let store = InMemoryReadModelStore::new();
        store.save(row("r1", 1)).await.unwrap();
        store.save(row("r2", 5)).await.unwrap();

        let recent = store.find_where(|r| r.version > 2).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "r2");
    }
}
