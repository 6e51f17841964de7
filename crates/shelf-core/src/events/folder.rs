//! Folder-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::id::{FolderId, UserId};

/// Events emitted by the folder store on record mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FolderEvent {
    /// A folder record was created.
    Created {
        /// The new folder's ID.
        folder_id: FolderId,
        /// The owner of the new folder.
        owner_id: UserId,
        /// The parent folder, if nested.
        parent_id: Option<FolderId>,
    },
    /// A folder record was overwritten (rename, lock, visibility, or
    /// contributor-set change).
    Updated {
        /// The updated folder's ID.
        folder_id: FolderId,
    },
    /// One or more folder records were removed in a single atomic batch.
    Deleted {
        /// Every folder removed by the batch (a root and its descendants).
        folder_ids: Vec<FolderId>,
    },
}
