//! Contributor notification side-effects and lifecycle.
//!
//! Dispatch is best-effort by contract: a folder mutation that has already
//! committed must never be failed retroactively because its notification
//! could not be written or pushed. Failures are logged and swallowed.

use std::sync::Arc;

use tracing::{info, warn};

use shelf_core::error::AppError;
use shelf_core::result::AppResult;
use shelf_core::retry::{RetryPolicy, with_retry};
use shelf_core::types::id::{NotificationId, UserId};
use shelf_entity::folder::Folder;
use shelf_entity::notification::{ContributorChange, ContributorNotification};
use shelf_entity::user::UserProfile;
use shelf_realtime::{NotificationFeedHub, NotificationSubscription};
use shelf_store::store::NotificationStore;

use crate::collab::PushTransport;
use crate::context::RequestContext;

/// Creates, streams, and retires contributor notifications.
#[derive(Clone)]
pub struct ContributorNotificationDispatcher {
    /// Notification store.
    store: Arc<dyn NotificationStore>,
    /// Live per-recipient fanout.
    hub: Arc<NotificationFeedHub>,
    /// Optional push pipeline.
    push: Option<Arc<dyn PushTransport>>,
    /// Retry policy for transient store failures.
    retry: RetryPolicy,
}

impl std::fmt::Debug for ContributorNotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContributorNotificationDispatcher")
            .field("push_enabled", &self.push.is_some())
            .finish()
    }
}

impl ContributorNotificationDispatcher {
    /// Creates a new dispatcher.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        hub: Arc<NotificationFeedHub>,
        push: Option<Arc<dyn PushTransport>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            hub,
            push,
            retry,
        }
    }

    /// Record that a user was added to a folder's contributor set.
    pub async fn notify_added(&self, folder: &Folder, owner: &UserProfile, recipient_id: UserId) {
        self.dispatch(folder, owner, recipient_id, ContributorChange::Added)
            .await;
    }

    /// Record that a user was removed from a folder's contributor set.
    pub async fn notify_removed(&self, folder: &Folder, owner: &UserProfile, recipient_id: UserId) {
        self.dispatch(folder, owner, recipient_id, ContributorChange::Removed)
            .await;
    }

    async fn dispatch(
        &self,
        folder: &Folder,
        owner: &UserProfile,
        recipient_id: UserId,
        change: ContributorChange,
    ) {
        let notification = ContributorNotification::new(folder, owner, recipient_id, change);

        let stored = with_retry(self.retry, "notification_store.insert", || {
            self.store.insert(notification.clone())
        })
        .await;
        if let Err(err) = stored {
            warn!(
                folder_id = %folder.id,
                %recipient_id,
                error = %err,
                "Failed to store contributor notification"
            );
            return;
        }

        info!(
            notification_id = %notification.id,
            folder_id = %folder.id,
            %recipient_id,
            change = ?change,
            "Contributor notification created"
        );

        if let Some(push) = &self.push
            && let Err(err) = push.forward(&notification).await
        {
            warn!(
                notification_id = %notification.id,
                %recipient_id,
                error = %err,
                "Push forwarding failed"
            );
        }
    }

    /// Live stream of the caller's own notifications, newest first.
    pub async fn stream_notifications(
        &self,
        ctx: &RequestContext,
    ) -> AppResult<NotificationSubscription> {
        self.hub.subscribe(ctx.user_id).await
    }

    /// Mark a notification read. Recipient only.
    pub async fn mark_read(
        &self,
        ctx: &RequestContext,
        notification_id: NotificationId,
    ) -> AppResult<ContributorNotification> {
        let mut notification = self.fetch(notification_id).await?;
        if notification.recipient_id != ctx.user_id {
            return Err(AppError::permission_denied(
                "Only the recipient can mark a notification read",
            ));
        }

        if !notification.is_read {
            notification.is_read = true;
            with_retry(self.retry, "notification_store.update", || {
                self.store.update(notification.clone())
            })
            .await?;
        }
        Ok(notification)
    }

    /// Delete a notification. Allowed for the recipient and for the folder
    /// owner who produced it.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        notification_id: NotificationId,
    ) -> AppResult<()> {
        let notification = self.fetch(notification_id).await?;
        if notification.recipient_id != ctx.user_id && notification.owner_id != ctx.user_id {
            return Err(AppError::permission_denied(
                "Only the recipient or the sending owner can delete a notification",
            ));
        }

        with_retry(self.retry, "notification_store.delete", || {
            self.store.delete(notification_id)
        })
        .await
    }

    async fn fetch(&self, notification_id: NotificationId) -> AppResult<ContributorNotification> {
        with_retry(self.retry, "notification_store.get", || {
            self.store.get(notification_id)
        })
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notification {notification_id} not found")))
    }
}
