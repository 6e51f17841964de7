//! Folder entity model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelf_core::types::id::{FolderId, UserId};

/// A permissioned, nestable collection.
///
/// Folders form a forest: `parent_id` is set once at creation and never
/// changed, so cycles are impossible by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// The folder owner; immutable after creation.
    pub owner_id: UserId,
    /// Parent folder ID (None for top-level folders).
    pub parent_id: Option<FolderId>,
    /// Display name.
    pub name: String,
    /// Whether the contributor set is meaningful.
    pub is_shared: bool,
    /// Users (excluding the owner) granted view/contribute rights.
    pub contributor_ids: BTreeSet<UserId>,
    /// Whether any authenticated user may view via the public catalog.
    pub is_public: bool,
    /// Whether contributors have lost contribute rights (view is kept).
    pub is_locked: bool,
    /// Set when `is_locked` transitions to true, cleared on unlock.
    pub locked_at: Option<DateTime<Utc>>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last modified.
    pub last_modified: DateTime<Utc>,
}

impl Folder {
    /// Build a fresh folder record from a creation request.
    pub fn new(create: CreateFolder) -> Self {
        let now = Utc::now();
        Self {
            id: FolderId::new(),
            owner_id: create.owner_id,
            parent_id: create.parent_id,
            name: create.name,
            is_shared: create.is_shared,
            contributor_ids: BTreeSet::new(),
            is_public: create.is_public,
            is_locked: false,
            locked_at: None,
            created_at: now,
            last_modified: now,
        }
    }

    /// Check if this is a top-level folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if a user is in the contributor set. Owners are not listed as
    /// contributors; ownership is checked separately everywhere.
    pub fn is_contributor(&self, user_id: UserId) -> bool {
        self.contributor_ids.contains(&user_id)
    }

    /// Stamp the record as modified now.
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// The folder owner.
    pub owner_id: UserId,
    /// Parent folder (None for top-level).
    pub parent_id: Option<FolderId>,
    /// Display name.
    pub name: String,
    /// Whether the folder starts out shared.
    #[serde(default)]
    pub is_shared: bool,
    /// Whether the folder starts out public.
    #[serde(default)]
    pub is_public: bool,
}
