//! Contributor notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelf_core::types::id::{FolderId, NotificationId, UserId};

use crate::folder::Folder;
use crate::user::UserProfile;

/// Which contributor-set mutation produced the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorChange {
    /// The recipient was added to the folder's contributor set.
    Added,
    /// The recipient was removed from the folder's contributor set.
    Removed,
}

/// A record telling a user they were added to or removed from a shared
/// folder.
///
/// Lifecycle: created, optionally marked read by the recipient, deleted by
/// either the folder owner who sent it or the recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorNotification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The folder whose contributor set changed.
    pub folder_id: FolderId,
    /// Folder name at the time of the change.
    pub folder_name: String,
    /// The folder owner who made the change.
    pub owner_id: UserId,
    /// Owner display name at the time of the change.
    pub owner_username: String,
    /// The added/removed contributor this record is addressed to.
    pub recipient_id: UserId,
    /// Whether the recipient was added or removed.
    pub change: ContributorChange,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// Whether the recipient has read this notification.
    pub is_read: bool,
}

impl ContributorNotification {
    /// Build a notification for a contributor-set change on a folder.
    pub fn new(
        folder: &Folder,
        owner: &UserProfile,
        recipient_id: UserId,
        change: ContributorChange,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            folder_id: folder.id,
            folder_name: folder.name.clone(),
            owner_id: folder.owner_id,
            owner_username: owner.username.clone(),
            recipient_id,
            change,
            created_at: Utc::now(),
            is_read: false,
        }
    }
}
