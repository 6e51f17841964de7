//! In-memory notification store with per-recipient change feeds.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::broadcast;

use shelf_core::error::AppError;
use shelf_core::events::NotificationEvent;
use shelf_core::result::AppResult;
use shelf_core::types::id::{NotificationId, UserId};
use shelf_entity::notification::ContributorNotification;

use crate::store::{NotificationFeed, NotificationStore};

/// Default broadcast buffer for the mutation event feed.
const DEFAULT_EVENT_BUFFER: usize = 256;

/// In-memory contributor notification store.
#[derive(Debug)]
pub struct MemoryNotificationStore {
    /// Notification ID → record.
    records: RwLock<HashMap<NotificationId, ContributorNotification>>,
    /// Mutation event fanout.
    events: broadcast::Sender<NotificationEvent>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_BUFFER);
        Self {
            records: RwLock::new(HashMap::new()),
            events,
        }
    }

    fn list_sorted(
        records: &HashMap<NotificationId, ContributorNotification>,
        user_id: UserId,
    ) -> Vec<ContributorNotification> {
        let mut list: Vec<ContributorNotification> = records
            .values()
            .filter(|n| n.recipient_id == user_id)
            .cloned()
            .collect();
        // Newest first.
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        list
    }
}

impl Default for MemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn get(&self, id: NotificationId) -> AppResult<Option<ContributorNotification>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn insert(&self, notification: ContributorNotification) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&notification.id) {
            return Err(AppError::conflict(format!(
                "Notification {} already exists",
                notification.id
            )));
        }

        let event = NotificationEvent::Created {
            notification_id: notification.id,
            recipient_id: notification.recipient_id,
        };
        records.insert(notification.id, notification);
        let _ = self.events.send(event);
        Ok(())
    }

    async fn update(&self, notification: ContributorNotification) -> AppResult<()> {
        let mut records = self.records.write().await;
        if !records.contains_key(&notification.id) {
            return Err(AppError::not_found(format!(
                "Notification {} not found",
                notification.id
            )));
        }

        let event = NotificationEvent::Updated {
            notification_id: notification.id,
            recipient_id: notification.recipient_id,
        };
        records.insert(notification.id, notification);
        let _ = self.events.send(event);
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> AppResult<()> {
        let mut records = self.records.write().await;
        let removed = records
            .remove(&id)
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;

        let _ = self.events.send(NotificationEvent::Deleted {
            notification_id: removed.id,
            recipient_id: removed.recipient_id,
        });
        Ok(())
    }

    async fn list_for_recipient(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<ContributorNotification>> {
        let records = self.records.read().await;
        Ok(Self::list_sorted(&records, user_id))
    }

    async fn watch_recipient(&self, user_id: UserId) -> AppResult<NotificationFeed> {
        let records = self.records.read().await;
        let events = self.events.subscribe();
        let snapshot = Self::list_sorted(&records, user_id);
        Ok(NotificationFeed { snapshot, events })
    }
}

#[cfg(test)]
mod tests {
    use shelf_entity::folder::{CreateFolder, Folder};
    use shelf_entity::notification::ContributorChange;
    use shelf_entity::user::UserProfile;

    use super::*;

    fn notification(recipient: UserId) -> ContributorNotification {
        let owner = UserId::new();
        let folder = Folder::new(CreateFolder {
            owner_id: owner,
            parent_id: None,
            name: "holiday".to_string(),
            is_shared: true,
            is_public: false,
        });
        let profile = UserProfile {
            id: owner,
            username: "alice".to_string(),
            avatar_url: None,
        };
        ContributorNotification::new(&folder, &profile, recipient, ContributorChange::Added)
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MemoryNotificationStore::new();
        let recipient = UserId::new();

        let mut first = notification(recipient);
        let mut second = notification(recipient);
        first.created_at = chrono::Utc::now() - chrono::Duration::seconds(60);
        second.created_at = chrono::Utc::now();

        store.insert(first.clone()).await.unwrap();
        store.insert(second.clone()).await.unwrap();

        let list = store.list_for_recipient(recipient).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_recipient() {
        let store = MemoryNotificationStore::new();
        let recipient = UserId::new();
        let other = UserId::new();

        store.insert(notification(recipient)).await.unwrap();
        store.insert(notification(other)).await.unwrap();

        assert_eq!(store.list_for_recipient(recipient).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_watch_emits_on_insert() {
        let store = MemoryNotificationStore::new();
        let recipient = UserId::new();

        let mut feed = store.watch_recipient(recipient).await.unwrap();
        assert!(feed.snapshot.is_empty());

        store.insert(notification(recipient)).await.unwrap();
        let event = feed.events.recv().await.unwrap();
        assert_eq!(event.recipient_id(), recipient);
    }
}
