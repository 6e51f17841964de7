//! The three-predicate access engine.
//!
//! View, contribute, and administer are kept as separate predicates rather
//! than a single permission level because they decay at different points
//! of the lock/ownership lifecycle: locking a folder removes a
//! contributor's write access but not their read access, and administer
//! never extends past the owner at all.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use shelf_core::error::AppError;
use shelf_core::result::AppResult;
use shelf_core::types::id::UserId;
use shelf_entity::folder::Folder;
use shelf_store::store::FolderStore;

use crate::context::ViewContext;

/// The full permission bundle for one (folder, user, context) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether the user may see the folder in this context.
    pub can_view: bool,
    /// Whether the user may write into the folder.
    pub can_contribute: bool,
    /// Whether the user may change sharing, locking, or existence.
    pub can_administer: bool,
}

/// Stateless permission evaluator.
///
/// Holds a folder store handle solely to fetch parent folders during
/// inheritance walks; every call evaluates against freshly fetched data.
#[derive(Clone)]
pub struct AccessEngine {
    /// Store used for parent-chain lookups.
    store: Arc<dyn FolderStore>,
}

impl std::fmt::Debug for AccessEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessEngine").finish()
    }
}

impl AccessEngine {
    /// Creates a new engine over a folder store.
    pub fn new(store: Arc<dyn FolderStore>) -> Self {
        Self { store }
    }

    /// Owner or listed contributor of a shared folder.
    ///
    /// This is the personal-library predicate: a foreign folder that is
    /// merely public does NOT satisfy it.
    fn in_personal_library(folder: &Folder, user_id: UserId) -> bool {
        folder.owner_id == user_id || (folder.is_shared && folder.is_contributor(user_id))
    }

    /// View predicate applied at each level of a nested walk.
    fn views_at_level(folder: &Folder, user_id: UserId) -> bool {
        Self::in_personal_library(folder, user_id) || folder.is_public
    }

    /// Contribute predicate applied at each level of a nested walk.
    /// Locking strips contributors of write access but never the owner,
    /// and public visibility grants nothing here.
    fn contributes_at_level(folder: &Folder, user_id: UserId) -> bool {
        folder.owner_id == user_id
            || (folder.is_shared && folder.is_contributor(user_id) && !folder.is_locked)
    }

    /// Whether the user may see the folder in the given context.
    pub async fn can_view(
        &self,
        folder: &Folder,
        user_id: UserId,
        ctx: &ViewContext,
    ) -> AppResult<bool> {
        match ctx {
            ViewContext::PublicCatalog => Ok(folder.is_public),
            ViewContext::PersonalLibrary => Ok(Self::in_personal_library(folder, user_id)),
            ViewContext::FolderChildren(_) => {
                self.walk_up(folder, user_id, Self::views_at_level).await
            }
        }
    }

    /// Whether the user may write into the folder in the given context.
    pub async fn can_contribute(
        &self,
        folder: &Folder,
        user_id: UserId,
        ctx: &ViewContext,
    ) -> AppResult<bool> {
        if ctx.is_nested() {
            self.walk_up(folder, user_id, Self::contributes_at_level)
                .await
        } else {
            Ok(Self::contributes_at_level(folder, user_id))
        }
    }

    /// Whether the user may administer the folder. Strictly the owner;
    /// never inherited, never granted via contributor status.
    pub fn can_administer(&self, folder: &Folder, user_id: UserId) -> bool {
        folder.owner_id == user_id
    }

    /// Evaluate all three predicates at once.
    pub async fn decide(
        &self,
        folder: &Folder,
        user_id: UserId,
        ctx: &ViewContext,
    ) -> AppResult<AccessDecision> {
        Ok(AccessDecision {
            can_view: self.can_view(folder, user_id, ctx).await?,
            can_contribute: self.can_contribute(folder, user_id, ctx).await?,
            can_administer: self.can_administer(folder, user_id),
        })
    }

    /// Errors with `PermissionDenied` unless the user may view the folder.
    pub async fn require_view(
        &self,
        folder: &Folder,
        user_id: UserId,
        ctx: &ViewContext,
    ) -> AppResult<()> {
        if self.can_view(folder, user_id, ctx).await? {
            Ok(())
        } else {
            debug!(folder_id = %folder.id, user_id = %user_id, "View denied");
            Err(AppError::permission_denied(
                "You do not have access to this folder",
            ))
        }
    }

    /// Errors with `PermissionDenied` unless the user may contribute.
    pub async fn require_contribute(
        &self,
        folder: &Folder,
        user_id: UserId,
        ctx: &ViewContext,
    ) -> AppResult<()> {
        if self.can_contribute(folder, user_id, ctx).await? {
            Ok(())
        } else {
            debug!(folder_id = %folder.id, user_id = %user_id, "Contribute denied");
            Err(AppError::permission_denied(
                "You do not have write access to this folder",
            ))
        }
    }

    /// Errors with `PermissionDenied` unless the user owns the folder.
    pub fn require_administer(&self, folder: &Folder, user_id: UserId) -> AppResult<()> {
        if self.can_administer(folder, user_id) {
            Ok(())
        } else {
            debug!(folder_id = %folder.id, user_id = %user_id, "Administer denied");
            Err(AppError::permission_denied(
                "Only the folder owner can perform this action",
            ))
        }
    }

    /// Walk the parent chain, applying `predicate` at each level until it
    /// grants or the chain ends.
    ///
    /// One store fetch per ancestor level actually consulted. A missing
    /// parent record ends the walk without granting (fail closed): the
    /// result is then the direct ownership/contributor/public answer only.
    async fn walk_up(
        &self,
        folder: &Folder,
        user_id: UserId,
        predicate: fn(&Folder, UserId) -> bool,
    ) -> AppResult<bool> {
        if predicate(folder, user_id) {
            return Ok(true);
        }

        let mut next_parent = folder.parent_id;
        while let Some(parent_id) = next_parent {
            match self.store.get(parent_id).await? {
                Some(parent) => {
                    if predicate(&parent, user_id) {
                        return Ok(true);
                    }
                    next_parent = parent.parent_id;
                }
                None => {
                    debug!(parent_id = %parent_id, "Parent lookup failed, ending inheritance walk");
                    return Ok(false);
                }
            }
        }
        Ok(false)
    }
}
