//! User profile read model: one row per user aggregate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, Version};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::event::ProjectedEvent;
use crate::memory::InMemoryReadModelStore;
use crate::projection::Projection;
use crate::read_model::{ReadModel, ReadModelStore};
use crate::{ProjectionError, Result};

pub const USER_CREATED: &str = "UserCreated";
pub const USER_NAME_UPDATED: &str = "UserNameUpdated";
pub const USER_EMAIL_CHANGED: &str = "UserEmailChanged";
pub const USER_DELETED: &str = "UserDeleted";

/// Current state of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: AggregateId,
    pub name: String,
    pub email: String,
    /// Version of the last event applied to this row.
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReadModel for UserProfile {
    type Id = AggregateId;

    fn id(&self) -> AggregateId {
        self.id.clone()
    }
}

#[derive(Debug, Deserialize)]
struct UserCreatedData {
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct UserNameUpdatedData {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserEmailChangedData {
    email: String,
}

/// Read model view of user profiles.
///
/// Events at or below a row's `version` are skipped, so replaying a log that
/// was already applied leaves the view unchanged. Deleted users keep the
/// version of their deletion, so a redelivered older event cannot bring
/// them back.
#[derive(Clone, Default)]
pub struct UserProfileView<S = InMemoryReadModelStore<UserProfile>> {
    store: S,
    deleted: Arc<RwLock<HashMap<AggregateId, Version>>>,
}

impl UserProfileView {
    /// Creates a view over a fresh in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> UserProfileView<S>
where
    S: ReadModelStore<Model = UserProfile>,
{
    /// Creates a view over an existing store.
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            deleted: Arc::default(),
        }
    }

    /// The store this view writes to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gets a single user's profile.
    pub async fn get_user(&self, id: &AggregateId) -> Result<Option<UserProfile>> {
        self.store.find_by_id(id).await
    }

    /// Gets every user, ordered by name.
    pub async fn get_all_users(&self) -> Result<Vec<UserProfile>> {
        let mut users = self.store.find_all().await?;
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    /// Whether `event` is at or below the version its user was deleted at.
    async fn predates_deletion(&self, event: &ProjectedEvent) -> bool {
        self.deleted
            .read()
            .await
            .get(&event.aggregate_id)
            .is_some_and(|deleted_at| *deleted_at >= event.aggregate_version)
    }

    /// Loads the row an update event applies to, or `None` if it is stale.
    async fn load_for_update(&self, event: &ProjectedEvent) -> Result<Option<UserProfile>> {
        let profile = self
            .store
            .find_by_id(&event.aggregate_id)
            .await?
            .ok_or_else(|| {
                ProjectionError::Projection(format!(
                    "{} for unknown user {}",
                    event.event_type, event.aggregate_id
                ))
            })?;

        if profile.version >= event.aggregate_version {
            tracing::debug!(
                aggregate_id = %event.aggregate_id,
                stored = %profile.version,
                incoming = %event.aggregate_version,
                "skipping already-applied event"
            );
            return Ok(None);
        }
        Ok(Some(profile))
    }
}

#[async_trait]
impl<S> Projection for UserProfileView<S>
where
    S: ReadModelStore<Model = UserProfile>,
{
    fn name(&self) -> &str {
        "user_profiles"
    }

    async fn project(&self, event: &ProjectedEvent) -> Result<()> {
        if self.predates_deletion(event).await {
            tracing::debug!(
                aggregate_id = %event.aggregate_id,
                incoming = %event.aggregate_version,
                "skipping event for deleted user"
            );
            return Ok(());
        }

        match event.event_type.as_str() {
            USER_CREATED => {
                let data: UserCreatedData = event.payload_as()?;
                if let Some(existing) = self.store.find_by_id(&event.aggregate_id).await?
                    && existing.version >= event.aggregate_version
                {
                    return Ok(());
                }
                self.store
                    .save(UserProfile {
                        id: event.aggregate_id.clone(),
                        name: data.name,
                        email: data.email,
                        version: event.aggregate_version,
                        created_at: event.occurred_at,
                        updated_at: event.occurred_at,
                    })
                    .await
            }
            USER_NAME_UPDATED => {
                let data: UserNameUpdatedData = event.payload_as()?;
                let Some(mut profile) = self.load_for_update(event).await? else {
                    return Ok(());
                };
                profile.name = data.name;
                profile.version = event.aggregate_version;
                profile.updated_at = event.occurred_at;
                self.store.save(profile).await
            }
            USER_EMAIL_CHANGED => {
                let data: UserEmailChangedData = event.payload_as()?;
                let Some(mut profile) = self.load_for_update(event).await? else {
                    return Ok(());
                };
                profile.email = data.email;
                profile.version = event.aggregate_version;
                profile.updated_at = event.occurred_at;
                self.store.save(profile).await
            }
            USER_DELETED => {
                if let Some(profile) = self.store.find_by_id(&event.aggregate_id).await?
                    && profile.version >= event.aggregate_version
                {
                    return Ok(());
                }
                self.store.delete(&event.aggregate_id).await?;
                self.deleted
                    .write()
                    .await
                    .insert(event.aggregate_id.clone(), event.aggregate_version);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn reset(&self) -> Result<()> {
        self.deleted.write().await.clear();
        self.store.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(
        id: &str,
        version: i64,
        event_type: &str,
        payload: serde_json::Value,
    ) -> ProjectedEvent {
        ProjectedEvent::builder()
            .event_type(event_type)
            .aggregate_id(id)
            .aggregate_version(Version::new(version))
            .payload_raw(payload)
            .build()
            .unwrap()
    }

    fn created(id: &str, name: &str) -> ProjectedEvent {
        make_event(
            id,
            1,
            USER_CREATED,
            serde_json::json!({"name": name, "email": format!("{name}@example.com")}),
        )
    }

    #[tokio::test]
    async fn test_user_created() {
        let view = UserProfileView::new();
        view.project(&created("u1", "ada")).await.unwrap();

        let user = view.get_user(&AggregateId::new("u1")).await.unwrap().unwrap();
        assert_eq!(user.name, "ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.version, Version::first());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[tokio::test]
    async fn test_name_and_email_updates() {
        let view = UserProfileView::new();
        view.project(&created("u1", "ada")).await.unwrap();
        view.project(&make_event(
            "u1",
            2,
            USER_NAME_UPDATED,
            serde_json::json!({"name": "Ada Lovelace"}),
        ))
        .await
        .unwrap();
        view.project(&make_event(
            "u1",
            3,
            USER_EMAIL_CHANGED,
            serde_json::json!({"email": "ada@engine.org"}),
        ))
        .await
        .unwrap();

        let user = view.get_user(&AggregateId::new("u1")).await.unwrap().unwrap();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@engine.org");
        assert_eq!(user.version, Version::new(3));
    }

    #[tokio::test]
    async fn test_stale_events_are_skipped() {
        let view = UserProfileView::new();
        view.project(&created("u1", "ada")).await.unwrap();
        let rename = make_event("u1", 2, USER_NAME_UPDATED, serde_json::json!({"name": "B"}));
        view.project(&rename).await.unwrap();

        view.project(&created("u1", "ada")).await.unwrap();
        view.project(&make_event("u1", 2, USER_NAME_UPDATED, serde_json::json!({"name": "C"})))
            .await
            .unwrap();

        let user = view.get_user(&AggregateId::new("u1")).await.unwrap().unwrap();
        assert_eq!(user.name, "B");
        assert_eq!(user.version, Version::new(2));
    }

    #[tokio::test]
    async fn test_update_for_unknown_user_fails() {
        let view = UserProfileView::new();
        let err = view
            .project(&make_event("ghost", 2, USER_NAME_UPDATED, serde_json::json!({"name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectionError::Projection(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload_fails() {
        let view = UserProfileView::new();
        let err = view
            .project(&make_event("u1", 1, USER_CREATED, serde_json::json!({"name": 7})))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectionError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_deleted_removes_row() {
        let view = UserProfileView::new();
        view.project(&created("u1", "ada")).await.unwrap();
        view.project(&make_event("u1", 2, USER_DELETED, serde_json::Value::Null))
            .await
            .unwrap();
        assert!(view.get_user(&AggregateId::new("u1")).await.unwrap().is_none());

        view.project(&make_event("u9", 2, USER_DELETED, serde_json::Value::Null))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_redelivered_create_does_not_restore_deleted_user() {
        let view = UserProfileView::new();
        view.project(&created("u1", "ada")).await.unwrap();
        view.project(&make_event("u1", 2, USER_DELETED, serde_json::Value::Null))
            .await
            .unwrap();

        view.project(&created("u1", "ada")).await.unwrap();
        assert!(view.get_user(&AggregateId::new("u1")).await.unwrap().is_none());

        // A later create for the same id is a new lifecycle.
        let recreated = make_event(
            "u1",
            3,
            USER_CREATED,
            serde_json::json!({"name": "ada", "email": "ada@new.io"}),
        );
        view.project(&recreated).await.unwrap();
        let user = view.get_user(&AggregateId::new("u1")).await.unwrap().unwrap();
        assert_eq!(user.email, "ada@new.io");
        assert_eq!(user.version, Version::new(3));
    }

    #[tokio::test]
    async fn test_reset_forgets_deletions() {
        let view = UserProfileView::new();
        view.project(&created("u1", "ada")).await.unwrap();
        view.project(&make_event("u1", 2, USER_DELETED, serde_json::Value::Null))
            .await
            .unwrap();

        view.reset().await.unwrap();
        view.project(&created("u1", "ada")).await.unwrap();

        assert!(view.get_user(&AggregateId::new("u1")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unrelated_events_are_ignored() {
        let view = UserProfileView::new();
        view.project(&make_event("o1", 1, "OrderPlaced", serde_json::json!({"total": 5})))
            .await
            .unwrap();
        assert_eq!(view.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_clears_and_is_repeatable() {
        let view = UserProfileView::new();
        view.reset().await.unwrap();
        view.project(&created("u1", "ada")).await.unwrap();
        view.project(&created("u2", "bob")).await.unwrap();

        view.reset().await.unwrap();
        view.reset().await.unwrap();

        assert!(view.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shared_store_sees_projected_rows() {
        let store: InMemoryReadModelStore<UserProfile> = InMemoryReadModelStore::new();
        let view = UserProfileView::with_store(store.clone());
        view.project(&created("u1", "ada")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }
}
