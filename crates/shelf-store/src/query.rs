//! Query shapes the folder store can filter and watch on.

use serde::{Deserialize, Serialize};

use shelf_core::types::id::{FolderId, UserId};
use shelf_entity::folder::Folder;

/// A composite filter over folder records.
///
/// Each variant is one "viewing context" query shape; live streams are
/// deduplicated per distinct value of this type, so it is `Hash + Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderQuery {
    /// Folders where the user is the owner or in the contributor set.
    ///
    /// This is the store-level personal-library query. It deliberately does
    /// NOT match foreign public folders; those are only reachable through
    /// [`FolderQuery::Public`].
    AccessibleTo(UserId),
    /// Direct children of a folder.
    ChildrenOf(FolderId),
    /// All public folders, regardless of requester.
    Public,
}

impl FolderQuery {
    /// Whether a folder record satisfies this filter.
    pub fn matches(&self, folder: &Folder) -> bool {
        match self {
            Self::AccessibleTo(user_id) => {
                folder.owner_id == *user_id || folder.is_contributor(*user_id)
            }
            Self::ChildrenOf(parent_id) => folder.parent_id == Some(*parent_id),
            Self::Public => folder.is_public,
        }
    }
}

#[cfg(test)]
mod tests {
    use shelf_entity::folder::CreateFolder;

    use super::*;

    fn folder(owner: UserId, parent: Option<FolderId>, public: bool) -> Folder {
        Folder::new(CreateFolder {
            owner_id: owner,
            parent_id: parent,
            name: "f".to_string(),
            is_shared: false,
            is_public: public,
        })
    }

    #[test]
    fn test_accessible_to_matches_owner_and_contributor_only() {
        let owner = UserId::new();
        let contributor = UserId::new();
        let stranger = UserId::new();

        let mut f = folder(owner, None, true);
        f.contributor_ids.insert(contributor);

        assert!(FolderQuery::AccessibleTo(owner).matches(&f));
        assert!(FolderQuery::AccessibleTo(contributor).matches(&f));
        // Public alone never places a folder in someone's personal library.
        assert!(!FolderQuery::AccessibleTo(stranger).matches(&f));
    }

    #[test]
    fn test_children_of_matches_direct_children() {
        let parent = FolderId::new();
        let child = folder(UserId::new(), Some(parent), false);
        let root = folder(UserId::new(), None, false);

        assert!(FolderQuery::ChildrenOf(parent).matches(&child));
        assert!(!FolderQuery::ChildrenOf(parent).matches(&root));
    }

    #[test]
    fn test_public_matches_on_flag() {
        assert!(FolderQuery::Public.matches(&folder(UserId::new(), None, true)));
        assert!(!FolderQuery::Public.matches(&folder(UserId::new(), None, false)));
    }
}
