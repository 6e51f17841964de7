//! External collaborator interfaces.
//!
//! These are consumed, never implemented, by this workspace (tests carry
//! stubs): binary media storage, the user directory, and the push delivery
//! pipeline live elsewhere.

use async_trait::async_trait;

use shelf_core::result::AppResult;
use shelf_core::types::id::{FolderId, UserId};
use shelf_entity::notification::ContributorNotification;
use shelf_entity::user::UserProfile;

/// The upload subsystem. The folder engine never manages binary storage
/// itself; it only asks for a folder's media to be dropped during a
/// deletion cascade.
#[async_trait]
pub trait MediaCollaborator: Send + Sync {
    /// Delete every media entry owned by a folder. Must be idempotent so a
    /// retried cascade reconverges.
    async fn delete_all_media_for_folder(&self, folder_id: FolderId) -> AppResult<()>;
}

/// The user directory.
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// Resolve a user's profile. `None` for deleted accounts.
    async fn resolve_profile(&self, user_id: UserId) -> AppResult<Option<UserProfile>>;
}

/// Push delivery. Forwarding is best-effort end to end: the dispatcher
/// logs and swallows failures here.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Forward a notification payload for push delivery.
    async fn forward(&self, notification: &ContributorNotification) -> AppResult<()>;
}
