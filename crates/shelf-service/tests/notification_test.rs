//! Integration tests for contributor notifications.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use shelf_core::error::{AppError, ErrorKind};
use shelf_core::result::AppResult;
use shelf_core::types::id::{NotificationId, UserId};
use shelf_entity::notification::{ContributorChange, ContributorNotification};
use shelf_store::store::{NotificationFeed, NotificationStore};

#[tokio::test]
async fn test_added_contributor_gets_notification() {
    let app = helpers::TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let folder = app
        .create_shared_folder(&alice, "holiday", None, &[bob.user_id])
        .await;

    let list = app
        .notifications
        .list_for_recipient(bob.user_id)
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    let notification = &list[0];
    assert_eq!(notification.folder_id, folder.id);
    assert_eq!(notification.folder_name, "holiday");
    assert_eq!(notification.owner_username, "alice");
    assert_eq!(notification.change, ContributorChange::Added);
    assert!(!notification.is_read);

    let forwarded = app.push.forwarded();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].id, notification.id);
}

#[tokio::test]
async fn test_removed_contributor_gets_notification() {
    let app = helpers::TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let folder = app
        .create_shared_folder(&alice, "holiday", None, &[bob.user_id])
        .await;

    app.gateway
        .remove_contributor(&alice, folder.id, bob.user_id)
        .await
        .unwrap();

    let list = app
        .notifications
        .list_for_recipient(bob.user_id)
        .await
        .unwrap();
    // Newest first: the removal precedes the original add.
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].change, ContributorChange::Removed);
    assert_eq!(list[1].change, ContributorChange::Added);
}

#[tokio::test]
async fn test_push_failure_does_not_fail_the_mutation() {
    let app = helpers::TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let folder = app.create_folder(&alice, "holiday", None).await;

    app.push.fail_next_calls();
    let updated = app
        .gateway
        .add_contributors(&alice, folder.id, &[bob.user_id])
        .await
        .unwrap();

    // The mutation and the stored notification both survive.
    assert!(updated.is_contributor(bob.user_id));
    let list = app
        .notifications
        .list_for_recipient(bob.user_id)
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn test_notification_stream_emits_on_new_notification() {
    let app = helpers::TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let folder = app.create_folder(&alice, "holiday", None).await;

    let mut sub = app.dispatcher.stream_notifications(&bob).await.unwrap();
    let initial = tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(initial.is_empty());

    app.gateway
        .add_contributors(&alice, folder.id, &[bob.user_id])
        .await
        .unwrap();

    let updated = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let list = sub.recv().await.unwrap();
            if !list.is_empty() {
                return list;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(updated[0].folder_id, folder.id);
}

#[tokio::test]
async fn test_mark_read_is_recipient_only() {
    let app = helpers::TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    app.create_shared_folder(&alice, "holiday", None, &[bob.user_id])
        .await;

    let notification = app
        .notifications
        .list_for_recipient(bob.user_id)
        .await
        .unwrap()
        .remove(0);

    // The sending owner cannot mark it read.
    let err = app
        .dispatcher
        .mark_read(&alice, notification.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let read = app.dispatcher.mark_read(&bob, notification.id).await.unwrap();
    assert!(read.is_read);

    // Marking read twice is a no-op.
    let again = app.dispatcher.mark_read(&bob, notification.id).await.unwrap();
    assert!(again.is_read);
}

#[tokio::test]
async fn test_delete_allowed_for_recipient_and_sending_owner() {
    let app = helpers::TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let carol = app.create_user("carol");
    app.create_shared_folder(&alice, "holiday", None, &[bob.user_id, carol.user_id])
        .await;

    let bob_notification = app
        .notifications
        .list_for_recipient(bob.user_id)
        .await
        .unwrap()
        .remove(0);
    let carol_notification = app
        .notifications
        .list_for_recipient(carol.user_id)
        .await
        .unwrap()
        .remove(0);

    // A third party cannot delete someone else's notification.
    let err = app
        .dispatcher
        .delete(&carol, bob_notification.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    // Recipient deletes their own; the sending owner deletes the other.
    app.dispatcher.delete(&bob, bob_notification.id).await.unwrap();
    app.dispatcher
        .delete(&alice, carol_notification.id)
        .await
        .unwrap();

    assert!(app
        .notifications
        .list_for_recipient(bob.user_id)
        .await
        .unwrap()
        .is_empty());
    assert!(app
        .notifications
        .list_for_recipient(carol.user_id)
        .await
        .unwrap()
        .is_empty());
}

/// Notification store that is permanently down.
struct DownNotificationStore;

#[async_trait]
impl NotificationStore for DownNotificationStore {
    async fn get(&self, _id: NotificationId) -> AppResult<Option<ContributorNotification>> {
        Err(AppError::transient("notification store down"))
    }

    async fn insert(&self, _notification: ContributorNotification) -> AppResult<()> {
        Err(AppError::transient("notification store down"))
    }

    async fn update(&self, _notification: ContributorNotification) -> AppResult<()> {
        Err(AppError::transient("notification store down"))
    }

    async fn delete(&self, _id: NotificationId) -> AppResult<()> {
        Err(AppError::transient("notification store down"))
    }

    async fn list_for_recipient(
        &self,
        _user_id: UserId,
    ) -> AppResult<Vec<ContributorNotification>> {
        Err(AppError::transient("notification store down"))
    }

    async fn watch_recipient(&self, _user_id: UserId) -> AppResult<NotificationFeed> {
        Err(AppError::transient("notification store down"))
    }
}

#[tokio::test]
async fn test_notification_store_outage_does_not_fail_the_mutation() {
    use shelf_access::AccessEngine;
    use shelf_core::config::realtime::RealtimeConfig;
    use shelf_core::retry::RetryPolicy;
    use shelf_realtime::NotificationFeedHub;
    use shelf_service::{ContributorNotificationDispatcher, MutationGateway};
    use shelf_store::memory::MemoryFolderStore;
    use shelf_store::store::FolderStore;

    let folders: Arc<dyn FolderStore> = Arc::new(MemoryFolderStore::new());
    let engine = Arc::new(AccessEngine::new(folders.clone()));
    let down: Arc<dyn NotificationStore> = Arc::new(DownNotificationStore);
    let hub = Arc::new(NotificationFeedHub::new(
        down.clone(),
        RealtimeConfig::default(),
    ));
    let retry = RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(1),
    };
    let dispatcher = Arc::new(ContributorNotificationDispatcher::new(
        down, hub, None, retry,
    ));

    let profiles = Arc::new(helpers::StaticProfiles::default());
    let media = Arc::new(helpers::RecordingMedia::default());
    let gateway = MutationGateway::new(folders, engine, dispatcher, media, profiles.clone(), retry);

    let alice = shelf_service::RequestContext::new(UserId::new());
    profiles.add(alice.user_id, "alice");
    let bob = UserId::new();
    profiles.add(bob, "bob");

    let folder = gateway
        .create_folder(
            &alice,
            shelf_service::CreateFolderRequest {
                name: "resilient".to_string(),
                parent_id: None,
                is_shared: false,
                is_public: false,
            },
        )
        .await
        .unwrap();

    // The notification write fails internally; the mutation still commits.
    let updated = gateway
        .add_contributors(&alice, folder.id, &[bob])
        .await
        .unwrap();
    assert!(updated.is_contributor(bob));
}

#[tokio::test]
async fn test_missing_notification_is_not_found() {
    let app = helpers::TestApp::new();
    let bob = app.create_user("bob");

    let err = app
        .dispatcher
        .mark_read(&bob, shelf_core::types::id::NotificationId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
