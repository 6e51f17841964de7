//! Async trait interfaces for the folder and notification stores.

use async_trait::async_trait;
use tokio::sync::broadcast;

use shelf_core::events::{FolderEvent, NotificationEvent};
use shelf_core::result::AppResult;
use shelf_core::types::id::{FolderId, NotificationId, UserId};
use shelf_entity::folder::Folder;
use shelf_entity::notification::ContributorNotification;

use crate::query::FolderQuery;

/// A change feed opened against the folder store.
///
/// The snapshot reflects the query result at subscription time; every event
/// received afterwards signals that the result set may have changed and
/// should be re-queried. Snapshot and feed are taken under the same store
/// state, so no mutation falls between them.
pub struct FolderFeed {
    /// Query result at subscription time.
    pub snapshot: Vec<Folder>,
    /// Mutation events emitted after the snapshot was taken.
    pub events: broadcast::Receiver<FolderEvent>,
}

/// A change feed over one recipient's notification list.
pub struct NotificationFeed {
    /// Notification list (newest first) at subscription time.
    pub snapshot: Vec<ContributorNotification>,
    /// Mutation events emitted after the snapshot was taken.
    pub events: broadcast::Receiver<NotificationEvent>,
}

/// Durable, queryable storage for folder records.
///
/// Point reads, filtered queries, and per-query change feeds over a
/// schemaless keyed collection. Implementations signal unavailability with
/// `ErrorKind::TransientStore`; callers retry at their boundary.
#[async_trait]
pub trait FolderStore: Send + Sync {
    /// Fetch a folder by ID.
    async fn get(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Insert a new folder record. Fails with `Conflict` if the ID exists.
    async fn insert(&self, folder: Folder) -> AppResult<()>;

    /// Overwrite an existing record (last-writer-wins on the whole record).
    /// Fails with `NotFound` if the ID does not exist.
    async fn update(&self, folder: Folder) -> AppResult<()>;

    /// Remove a batch of folder records atomically: a concurrent reader
    /// observes either all records present or none. IDs that do not
    /// resolve are ignored.
    async fn remove_many(&self, ids: &[FolderId]) -> AppResult<()>;

    /// Run a filtered query, ordered by creation time.
    async fn query(&self, query: &FolderQuery) -> AppResult<Vec<Folder>>;

    /// Open a change feed for a query.
    async fn watch(&self, query: &FolderQuery) -> AppResult<FolderFeed>;
}

/// Durable storage for contributor notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Fetch a notification by ID.
    async fn get(&self, id: NotificationId) -> AppResult<Option<ContributorNotification>>;

    /// Insert a new notification record.
    async fn insert(&self, notification: ContributorNotification) -> AppResult<()>;

    /// Overwrite an existing record. Fails with `NotFound` if missing.
    async fn update(&self, notification: ContributorNotification) -> AppResult<()>;

    /// Delete a notification record. Fails with `NotFound` if missing.
    async fn delete(&self, id: NotificationId) -> AppResult<()>;

    /// List a recipient's notifications, newest first.
    async fn list_for_recipient(&self, user_id: UserId)
    -> AppResult<Vec<ContributorNotification>>;

    /// Open a change feed over a recipient's notification list.
    async fn watch_recipient(&self, user_id: UserId) -> AppResult<NotificationFeed>;
}
