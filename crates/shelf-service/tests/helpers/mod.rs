//! Shared test helpers for the service integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use shelf_access::AccessEngine;
use shelf_core::config::realtime::RealtimeConfig;
use shelf_core::error::AppError;
use shelf_core::result::AppResult;
use shelf_core::retry::RetryPolicy;
use shelf_core::types::id::{FolderId, UserId};
use shelf_entity::folder::Folder;
use shelf_entity::notification::ContributorNotification;
use shelf_entity::user::UserProfile;
use shelf_realtime::{FeedHub, FolderSubscription, NotificationFeedHub};
use shelf_service::{
    ContributorNotificationDispatcher, CreateFolderRequest, FolderRepository, MediaCollaborator,
    MutationGateway, ProfileProvider, PushTransport, RequestContext,
};
use shelf_store::memory::{MemoryFolderStore, MemoryNotificationStore};
use shelf_store::store::{FolderStore, NotificationStore};

/// How long a test waits for a stream emission before giving up.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// In-memory user directory.
#[derive(Default)]
pub struct StaticProfiles {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
}

impl StaticProfiles {
    pub fn add(&self, user_id: UserId, username: &str) {
        self.profiles.lock().unwrap().insert(
            user_id,
            UserProfile {
                id: user_id,
                username: username.to_string(),
                avatar_url: None,
            },
        );
    }
}

#[async_trait]
impl ProfileProvider for StaticProfiles {
    async fn resolve_profile(&self, user_id: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }
}

/// Media collaborator that records which folders were cleaned, and can be
/// told to fail.
#[derive(Default)]
pub struct RecordingMedia {
    cleaned: Mutex<Vec<FolderId>>,
    fail: AtomicBool,
}

impl RecordingMedia {
    pub fn cleaned(&self) -> Vec<FolderId> {
        self.cleaned.lock().unwrap().clone()
    }

    pub fn fail_next_calls(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaCollaborator for RecordingMedia {
    async fn delete_all_media_for_folder(&self, folder_id: FolderId) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::internal("media backend rejected the request"));
        }
        self.cleaned.lock().unwrap().push(folder_id);
        Ok(())
    }
}

/// Push transport that records forwarded notifications, and can be told to
/// fail.
#[derive(Default)]
pub struct RecordingPush {
    forwarded: Mutex<Vec<ContributorNotification>>,
    fail: AtomicBool,
}

impl RecordingPush {
    pub fn forwarded(&self) -> Vec<ContributorNotification> {
        self.forwarded.lock().unwrap().clone()
    }

    pub fn fail_next_calls(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PushTransport for RecordingPush {
    async fn forward(&self, notification: &ContributorNotification) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::transient("push gateway unavailable"));
        }
        self.forwarded.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Fully wired service stack over in-memory stores.
pub struct TestApp {
    pub folders: Arc<MemoryFolderStore>,
    pub notifications: Arc<MemoryNotificationStore>,
    pub folder_hub: Arc<FeedHub>,
    pub notification_hub: Arc<NotificationFeedHub>,
    pub repository: FolderRepository,
    pub gateway: MutationGateway,
    pub dispatcher: Arc<ContributorNotificationDispatcher>,
    pub profiles: Arc<StaticProfiles>,
    pub media: Arc<RecordingMedia>,
    pub push: Arc<RecordingPush>,
}

impl TestApp {
    pub fn new() -> Self {
        let folders = Arc::new(MemoryFolderStore::new());
        let notifications = Arc::new(MemoryNotificationStore::new());
        let folder_store: Arc<dyn FolderStore> = folders.clone();
        let notification_store: Arc<dyn NotificationStore> = notifications.clone();

        let engine = Arc::new(AccessEngine::new(folder_store.clone()));
        let realtime = RealtimeConfig {
            resubscribe_delay_ms: 10,
            ..RealtimeConfig::default()
        };
        let folder_hub = Arc::new(FeedHub::new(
            folder_store.clone(),
            engine.clone(),
            realtime.clone(),
        ));
        let notification_hub = Arc::new(NotificationFeedHub::new(
            notification_store.clone(),
            realtime,
        ));

        let profiles = Arc::new(StaticProfiles::default());
        let media = Arc::new(RecordingMedia::default());
        let push = Arc::new(RecordingPush::default());

        let retry = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };

        let dispatcher = Arc::new(ContributorNotificationDispatcher::new(
            notification_store,
            notification_hub.clone(),
            Some(push.clone()),
            retry,
        ));
        let repository = FolderRepository::new(
            folder_store.clone(),
            folder_hub.clone(),
            profiles.clone(),
            retry,
        );
        let gateway = MutationGateway::new(
            folder_store,
            engine,
            dispatcher.clone(),
            media.clone(),
            profiles.clone(),
            retry,
        );

        Self {
            folders,
            notifications,
            folder_hub,
            notification_hub,
            repository,
            gateway,
            dispatcher,
            profiles,
            media,
            push,
        }
    }

    /// Create a user with a registered profile.
    pub fn create_user(&self, username: &str) -> RequestContext {
        let user_id = UserId::new();
        self.profiles.add(user_id, username);
        RequestContext::new(user_id)
    }

    /// Create a folder through the gateway.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<FolderId>,
    ) -> Folder {
        self.gateway
            .create_folder(
                ctx,
                CreateFolderRequest {
                    name: name.to_string(),
                    parent_id,
                    is_shared: false,
                    is_public: false,
                },
            )
            .await
            .expect("Failed to create folder")
    }

    /// Create a shared folder with the given contributors.
    pub async fn create_shared_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<FolderId>,
        contributors: &[UserId],
    ) -> Folder {
        let folder = self.create_folder(ctx, name, parent_id).await;
        self.gateway
            .add_contributors(ctx, folder.id, contributors)
            .await
            .expect("Failed to add contributors")
    }
}

/// Receive the next emission, panicking if none arrives in time.
pub async fn recv_emission(sub: &mut FolderSubscription) -> Vec<Folder> {
    tokio::time::timeout(RECV_TIMEOUT, sub.recv())
        .await
        .expect("Timed out waiting for stream emission")
        .expect("Stream closed unexpectedly")
}

/// Drain emissions until one satisfies the predicate, panicking on timeout.
pub async fn recv_until(
    sub: &mut FolderSubscription,
    mut pred: impl FnMut(&[Folder]) -> bool,
) -> Vec<Folder> {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            let emission = sub.recv().await.expect("Stream closed unexpectedly");
            if pred(&emission) {
                return emission;
            }
        }
    })
    .await
    .expect("Timed out waiting for matching emission")
}
