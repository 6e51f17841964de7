//! Folder write surface.
//!
//! Every mutation is authorization-gated through the access engine before
//! the write is attempted, and fails closed: `PermissionDenied` when a
//! predicate fails, `NotFound` when the target does not resolve, and
//! `InvalidState` for structurally invalid requests. No operation
//! silently downgrades its scope.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shelf_access::{AccessEngine, ViewContext};
use shelf_core::error::AppError;
use shelf_core::result::AppResult;
use shelf_core::retry::{RetryPolicy, with_retry};
use shelf_core::types::id::{FolderId, UserId};
use shelf_entity::folder::{CreateFolder, Folder};
use shelf_entity::user::UserProfile;
use shelf_store::query::FolderQuery;
use shelf_store::store::FolderStore;

use crate::collab::{MediaCollaborator, ProfileProvider};
use crate::context::RequestContext;
use crate::notification::dispatcher::ContributorNotificationDispatcher;

/// Request to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None for top-level). Set once; folders are never
    /// re-parented, so the forest stays acyclic by construction.
    pub parent_id: Option<FolderId>,
    /// Whether the folder starts out shared.
    #[serde(default)]
    pub is_shared: bool,
    /// Whether the folder starts out public.
    #[serde(default)]
    pub is_public: bool,
}

/// Applies validated folder mutations.
#[derive(Clone)]
pub struct MutationGateway {
    /// Folder store.
    store: Arc<dyn FolderStore>,
    /// Access engine consulted before every write.
    engine: Arc<AccessEngine>,
    /// Notification side-effects on contributor changes.
    dispatcher: Arc<ContributorNotificationDispatcher>,
    /// Upload subsystem, called during deletion cascades.
    media: Arc<dyn MediaCollaborator>,
    /// User directory for owner profile resolution.
    profiles: Arc<dyn ProfileProvider>,
    /// Retry policy for transient store failures.
    retry: RetryPolicy,
}

impl std::fmt::Debug for MutationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationGateway").finish()
    }
}

impl MutationGateway {
    /// Creates a new gateway.
    pub fn new(
        store: Arc<dyn FolderStore>,
        engine: Arc<AccessEngine>,
        dispatcher: Arc<ContributorNotificationDispatcher>,
        media: Arc<dyn MediaCollaborator>,
        profiles: Arc<dyn ProfileProvider>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            engine,
            dispatcher,
            media,
            profiles,
            retry,
        }
    }

    /// Creates a new folder owned by the caller.
    ///
    /// Nesting requires contribute rights on the parent.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        if req.name.trim().is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }

        if let Some(parent_id) = req.parent_id {
            let parent = self.fetch_folder(parent_id).await?;
            self.engine
                .require_contribute(&parent, ctx.user_id, &ViewContext::FolderChildren(parent_id))
                .await?;
        }

        let folder = Folder::new(CreateFolder {
            owner_id: ctx.user_id,
            parent_id: req.parent_id,
            name: req.name,
            is_shared: req.is_shared,
            is_public: req.is_public,
        });

        with_retry(self.retry, "folder_store.insert", || {
            self.store.insert(folder.clone())
        })
        .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            parent_id = ?folder.parent_id,
            "Folder created"
        );
        Ok(folder)
    }

    /// Renames a folder. Contributors may rename; inherited contribute
    /// rights from an ancestor count.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<Folder> {
        if new_name.trim().is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }

        let mut folder = self.fetch_folder(folder_id).await?;
        self.engine
            .require_contribute(&folder, ctx.user_id, &Self::edit_context(&folder))
            .await?;

        folder.name = new_name.to_string();
        folder.touch();
        self.write_back(&folder).await?;

        info!(user_id = %ctx.user_id, folder_id = %folder_id, new_name, "Folder renamed");
        Ok(folder)
    }

    /// Sets or clears public visibility. Owner only.
    pub async fn set_public(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        value: bool,
    ) -> AppResult<Folder> {
        let mut folder = self.fetch_folder(folder_id).await?;
        self.engine.require_administer(&folder, ctx.user_id)?;

        folder.is_public = value;
        folder.touch();
        self.write_back(&folder).await?;

        info!(user_id = %ctx.user_id, folder_id = %folder_id, public = value, "Folder visibility changed");
        Ok(folder)
    }

    /// Locks a folder: contributors keep view access but lose contribute
    /// access until unlock. Owner only; the owner is unaffected.
    pub async fn lock_folder(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        let mut folder = self.fetch_folder(folder_id).await?;
        self.engine.require_administer(&folder, ctx.user_id)?;

        folder.is_locked = true;
        folder.locked_at = Some(Utc::now());
        folder.touch();
        self.write_back(&folder).await?;

        info!(user_id = %ctx.user_id, folder_id = %folder_id, "Folder locked");
        Ok(folder)
    }

    /// Unlocks a folder, restoring contributor write access. Owner only.
    pub async fn unlock_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<Folder> {
        let mut folder = self.fetch_folder(folder_id).await?;
        self.engine.require_administer(&folder, ctx.user_id)?;

        folder.is_locked = false;
        folder.locked_at = None;
        folder.touch();
        self.write_back(&folder).await?;

        info!(user_id = %ctx.user_id, folder_id = %folder_id, "Folder unlocked");
        Ok(folder)
    }

    /// Adds contributors to a folder. Owner only; all-or-nothing per call.
    ///
    /// The contributor set is written as one whole-record update
    /// (last-writer-wins on the full set). Already-present ids are
    /// deduplicated and do not re-notify; each newly added id gets one
    /// notification, dispatched best-effort after the write commits.
    pub async fn add_contributors(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        user_ids: &[UserId],
    ) -> AppResult<Folder> {
        let mut folder = self.fetch_folder(folder_id).await?;
        self.engine.require_administer(&folder, ctx.user_id)?;

        if user_ids.contains(&folder.owner_id) {
            return Err(AppError::invalid_state(
                "The owner cannot be added as a contributor",
            ));
        }

        let newly_added: Vec<UserId> = user_ids
            .iter()
            .filter(|id| !folder.contributor_ids.contains(id))
            .copied()
            .collect();
        if newly_added.is_empty() {
            // Nothing to add, but repair a drifted shared flag so the
            // contributor set and the flag stay in step.
            if !folder.contributor_ids.is_empty() && !folder.is_shared {
                folder.is_shared = true;
                folder.touch();
                self.write_back(&folder).await?;
            }
            return Ok(folder);
        }

        folder.contributor_ids.extend(newly_added.iter().copied());
        folder.is_shared = true;
        folder.touch();
        self.write_back(&folder).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            added = newly_added.len(),
            "Contributors added"
        );

        if let Some(owner) = self.owner_profile(&folder).await {
            for recipient_id in &newly_added {
                self.dispatcher
                    .notify_added(&folder, &owner, *recipient_id)
                    .await;
            }
        }
        Ok(folder)
    }

    /// Removes a contributor. Owner only.
    pub async fn remove_contributor(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        user_id: UserId,
    ) -> AppResult<Folder> {
        let mut folder = self.fetch_folder(folder_id).await?;
        self.engine.require_administer(&folder, ctx.user_id)?;

        if user_id == folder.owner_id {
            return Err(AppError::invalid_state(
                "The owner cannot be removed from their own folder",
            ));
        }
        if !folder.contributor_ids.remove(&user_id) {
            return Err(AppError::invalid_state(format!(
                "User {user_id} is not a contributor of folder {folder_id}"
            )));
        }

        folder.touch();
        self.write_back(&folder).await?;

        info!(user_id = %ctx.user_id, folder_id = %folder_id, removed = %user_id, "Contributor removed");

        if let Some(owner) = self.owner_profile(&folder).await {
            self.dispatcher
                .notify_removed(&folder, &owner, user_id)
                .await;
        }
        Ok(folder)
    }

    /// Deletes a folder, all descendant folders, and their media. Owner
    /// only.
    ///
    /// Media cleanup runs first, per folder; any failure aborts the
    /// operation with every folder record still intact (the collaborator
    /// is idempotent, so a retried cascade reconverges). The folder
    /// records themselves are removed in one atomic batch: a concurrent
    /// reader sees either all of them or none.
    pub async fn delete_folder(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<()> {
        let folder = self.fetch_folder(folder_id).await?;
        self.engine.require_administer(&folder, ctx.user_id)?;

        let doomed = self.collect_subtree(folder_id).await?;

        for id in &doomed {
            self.media.delete_all_media_for_folder(*id).await?;
        }

        with_retry(self.retry, "folder_store.remove_many", || {
            self.store.remove_many(&doomed)
        })
        .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            folders_removed = doomed.len(),
            "Folder deleted"
        );
        Ok(())
    }

    /// The context folder edits are authorized under: nested folders honor
    /// inherited contribute rights, top-level folders have nothing to
    /// inherit from.
    fn edit_context(folder: &Folder) -> ViewContext {
        match folder.parent_id {
            Some(parent_id) => ViewContext::FolderChildren(parent_id),
            None => ViewContext::PersonalLibrary,
        }
    }

    async fn fetch_folder(&self, folder_id: FolderId) -> AppResult<Folder> {
        with_retry(self.retry, "folder_store.get", || self.store.get(folder_id))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    async fn write_back(&self, folder: &Folder) -> AppResult<()> {
        with_retry(self.retry, "folder_store.update", || {
            self.store.update(folder.clone())
        })
        .await
    }

    /// Breadth-first walk of the folder subtree, root first.
    async fn collect_subtree(&self, root: FolderId) -> AppResult<Vec<FolderId>> {
        let mut doomed = vec![root];
        let mut cursor = 0;
        while cursor < doomed.len() {
            let parent_id = doomed[cursor];
            cursor += 1;

            let query = FolderQuery::ChildrenOf(parent_id);
            let children = with_retry(self.retry, "folder_store.query", || {
                self.store.query(&query)
            })
            .await?;
            doomed.extend(children.iter().map(|c| c.id));
        }
        Ok(doomed)
    }

    /// Resolve the owner's profile for notification side-effects.
    /// Notification delivery is decoupled from the mutation, so a failed
    /// lookup only skips the notifications.
    async fn owner_profile(&self, folder: &Folder) -> Option<UserProfile> {
        match self.profiles.resolve_profile(folder.owner_id).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                warn!(owner_id = %folder.owner_id, "Owner profile not found, skipping notifications");
                None
            }
            Err(err) => {
                warn!(owner_id = %folder.owner_id, error = %err, "Owner profile lookup failed, skipping notifications");
                None
            }
        }
    }
}
