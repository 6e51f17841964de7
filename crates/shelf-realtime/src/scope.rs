//! Per-subscriber viewing scopes and their emission filters.

use tracing::warn;

use shelf_access::{AccessEngine, ViewContext};
use shelf_core::types::id::{FolderId, UserId};
use shelf_core::types::pagination::PageRequest;
use shelf_entity::folder::Folder;
use shelf_store::query::FolderQuery;

/// One subscriber's viewing scope: who is looking, and from where.
///
/// The scope determines both the store query shape and the engine filter
/// re-applied to every emission (defense in depth against store-level
/// query drift).
#[derive(Debug, Clone)]
pub enum StreamScope {
    /// A user's personal library: folders they own or contribute to.
    Personal {
        /// The subscribing user.
        user_id: UserId,
    },
    /// Children of a folder the user already opened.
    Children {
        /// The subscribing user.
        user_id: UserId,
        /// The opened parent folder.
        parent_id: FolderId,
    },
    /// The global public catalog, paginated, requester-independent.
    Public {
        /// The page window to emit.
        page: PageRequest,
    },
}

impl StreamScope {
    /// The store query shape backing this scope. Scopes with the same
    /// query share one upstream feed.
    pub fn query(&self) -> FolderQuery {
        match self {
            Self::Personal { user_id } => FolderQuery::AccessibleTo(*user_id),
            Self::Children { parent_id, .. } => FolderQuery::ChildrenOf(*parent_id),
            Self::Public { .. } => FolderQuery::Public,
        }
    }

    /// Re-filter a raw store snapshot for this subscriber.
    ///
    /// A folder whose engine check fails (missing parent, transient fetch
    /// error) is excluded from the emission rather than surfaced.
    pub async fn filter(&self, engine: &AccessEngine, snapshot: &[Folder]) -> Vec<Folder> {
        match self {
            Self::Personal { user_id } => {
                filter_with_context(engine, snapshot, *user_id, ViewContext::PersonalLibrary).await
            }
            Self::Children { user_id, parent_id } => {
                filter_with_context(
                    engine,
                    snapshot,
                    *user_id,
                    ViewContext::FolderChildren(*parent_id),
                )
                .await
            }
            Self::Public { page } => {
                let visible: Vec<Folder> =
                    snapshot.iter().filter(|f| f.is_public).cloned().collect();
                page.slice(&visible)
            }
        }
    }
}

async fn filter_with_context(
    engine: &AccessEngine,
    snapshot: &[Folder],
    user_id: UserId,
    ctx: ViewContext,
) -> Vec<Folder> {
    let mut visible = Vec::with_capacity(snapshot.len());
    for folder in snapshot {
        match engine.can_view(folder, user_id, &ctx).await {
            Ok(true) => visible.push(folder.clone()),
            Ok(false) => {}
            Err(err) => {
                warn!(folder_id = %folder.id, error = %err, "Engine check failed, excluding folder from emission");
            }
        }
    }
    visible
}
