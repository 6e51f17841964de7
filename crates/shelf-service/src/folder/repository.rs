//! Folder read surface: point reads, contributor resolution, and live
//! streams per viewing context.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use shelf_core::error::AppError;
use shelf_core::result::AppResult;
use shelf_core::retry::{RetryPolicy, with_retry};
use shelf_core::types::id::{FolderId, UserId};
use shelf_core::types::pagination::PageRequest;
use shelf_entity::folder::Folder;
use shelf_entity::user::UserProfile;
use shelf_realtime::{FeedHub, FolderSubscription, StreamScope};
use shelf_store::store::FolderStore;

use crate::collab::ProfileProvider;

/// Read-side orchestration over the folder store.
///
/// Streams are engine-filtered: the store query narrows the candidate set,
/// and the access engine is re-applied to every emission, so a drifting
/// store query can widen nothing.
#[derive(Clone)]
pub struct FolderRepository {
    /// Folder store.
    store: Arc<dyn FolderStore>,
    /// Live-stream fanout.
    hub: Arc<FeedHub>,
    /// User directory for contributor resolution.
    profiles: Arc<dyn ProfileProvider>,
    /// Retry policy for transient store failures.
    retry: RetryPolicy,
}

impl std::fmt::Debug for FolderRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderRepository").finish()
    }
}

impl FolderRepository {
    /// Creates a new repository.
    pub fn new(
        store: Arc<dyn FolderStore>,
        hub: Arc<FeedHub>,
        profiles: Arc<dyn ProfileProvider>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            hub,
            profiles,
            retry,
        }
    }

    /// Live stream of the folders a user can see.
    ///
    /// With no parent this is the personal library: folders the user owns
    /// or contributes to, and nothing else — a foreign folder that is
    /// merely public stays out. With a parent it is that folder's child
    /// list, with parent inheritance honored.
    pub async fn stream_accessible_folders(
        &self,
        user_id: UserId,
        parent_folder_id: Option<FolderId>,
    ) -> AppResult<FolderSubscription> {
        let scope = match parent_folder_id {
            None => StreamScope::Personal { user_id },
            Some(parent_id) => StreamScope::Children { user_id, parent_id },
        };
        self.hub.subscribe(scope).await
    }

    /// Live stream of the global public catalog. Identical for every
    /// authenticated caller.
    pub async fn stream_public_folders(&self, page: PageRequest) -> AppResult<FolderSubscription> {
        self.hub.subscribe(StreamScope::Public { page }).await
    }

    /// Fetch a folder by ID.
    pub async fn get_folder(&self, folder_id: FolderId) -> AppResult<Folder> {
        with_retry(self.retry, "folder_store.get", || self.store.get(folder_id))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Resolve a folder's contributor profiles.
    ///
    /// Profiles that no longer resolve (deleted accounts) are skipped,
    /// never surfaced as errors.
    pub async fn get_contributors(&self, folder_id: FolderId) -> AppResult<Vec<UserProfile>> {
        let folder = self.get_folder(folder_id).await?;

        let lookups = folder
            .contributor_ids
            .iter()
            .map(|id| self.profiles.resolve_profile(*id));

        let mut contributors = Vec::with_capacity(folder.contributor_ids.len());
        for (user_id, resolved) in folder.contributor_ids.iter().zip(join_all(lookups).await) {
            match resolved {
                Ok(Some(profile)) => contributors.push(profile),
                Ok(None) => {
                    debug!(%user_id, "Contributor profile not found, skipping");
                }
                Err(err) => {
                    debug!(%user_id, error = %err, "Contributor profile lookup failed, skipping");
                }
            }
        }
        Ok(contributors)
    }
}
