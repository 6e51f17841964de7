//! In-memory folder store with broadcast change feeds.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use shelf_core::error::AppError;
use shelf_core::events::FolderEvent;
use shelf_core::result::AppResult;
use shelf_core::types::id::FolderId;
use shelf_entity::folder::Folder;

use crate::query::FolderQuery;
use crate::store::{FolderFeed, FolderStore};

/// Default broadcast buffer for the mutation event feed.
const DEFAULT_EVENT_BUFFER: usize = 256;

/// In-memory folder store.
///
/// Mutation events are sent while the write lock is held, and feeds
/// subscribe under the read lock, so a feed's snapshot and its event stream
/// never have a gap between them.
#[derive(Debug)]
pub struct MemoryFolderStore {
    /// Folder ID → record.
    records: RwLock<HashMap<FolderId, Folder>>,
    /// Mutation event fanout.
    events: broadcast::Sender<FolderEvent>,
}

impl MemoryFolderStore {
    /// Create an empty store with the default event buffer.
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_EVENT_BUFFER)
    }

    /// Create an empty store with an explicit event buffer size.
    pub fn with_buffer(buffer_size: usize) -> Self {
        let (events, _) = broadcast::channel(buffer_size);
        Self {
            records: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn run_query(records: &HashMap<FolderId, Folder>, query: &FolderQuery) -> Vec<Folder> {
        let mut matched: Vec<Folder> = records
            .values()
            .filter(|f| query.matches(f))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        matched
    }
}

impl Default for MemoryFolderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FolderStore for MemoryFolderStore {
    async fn get(&self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn insert(&self, folder: Folder) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&folder.id) {
            return Err(AppError::conflict(format!(
                "Folder {} already exists",
                folder.id
            )));
        }

        let event = FolderEvent::Created {
            folder_id: folder.id,
            owner_id: folder.owner_id,
            parent_id: folder.parent_id,
        };
        records.insert(folder.id, folder);
        let _ = self.events.send(event);
        Ok(())
    }

    async fn update(&self, folder: Folder) -> AppResult<()> {
        let mut records = self.records.write().await;
        if !records.contains_key(&folder.id) {
            return Err(AppError::not_found(format!("Folder {} not found", folder.id)));
        }

        let event = FolderEvent::Updated {
            folder_id: folder.id,
        };
        records.insert(folder.id, folder);
        let _ = self.events.send(event);
        Ok(())
    }

    async fn remove_many(&self, ids: &[FolderId]) -> AppResult<()> {
        let mut records = self.records.write().await;
        let removed: Vec<FolderId> = ids
            .iter()
            .filter(|id| records.remove(id).is_some())
            .copied()
            .collect();

        if !removed.is_empty() {
            debug!(count = removed.len(), "Removed folder batch");
            let _ = self.events.send(FolderEvent::Deleted {
                folder_ids: removed,
            });
        }
        Ok(())
    }

    async fn query(&self, query: &FolderQuery) -> AppResult<Vec<Folder>> {
        let records = self.records.read().await;
        Ok(Self::run_query(&records, query))
    }

    async fn watch(&self, query: &FolderQuery) -> AppResult<FolderFeed> {
        // Subscribe and snapshot under the same read lock; a writer cannot
        // slip a mutation between the two.
        let records = self.records.read().await;
        let events = self.events.subscribe();
        let snapshot = Self::run_query(&records, query);
        Ok(FolderFeed { snapshot, events })
    }
}

#[cfg(test)]
mod tests {
    use shelf_core::error::ErrorKind;
    use shelf_core::types::id::UserId;
    use shelf_entity::folder::CreateFolder;

    use super::*;

    fn folder(owner: UserId, parent: Option<FolderId>) -> Folder {
        Folder::new(CreateFolder {
            owner_id: owner,
            parent_id: parent,
            name: "f".to_string(),
            is_shared: false,
            is_public: false,
        })
    }

    #[tokio::test]
    async fn test_insert_get_update() {
        let store = MemoryFolderStore::new();
        let owner = UserId::new();
        let mut f = folder(owner, None);
        let id = f.id;

        store.insert(f.clone()).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().unwrap().name, "f");

        f.name = "renamed".to_string();
        store.update(f).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().unwrap().name, "renamed");
    }

    #[tokio::test]
    async fn test_insert_duplicate_conflicts() {
        let store = MemoryFolderStore::new();
        let f = folder(UserId::new(), None);
        store.insert(f.clone()).await.unwrap();
        let err = store.insert(f).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryFolderStore::new();
        let err = store.update(folder(UserId::new(), None)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_remove_many_removes_all() {
        let store = MemoryFolderStore::new();
        let owner = UserId::new();
        let a = folder(owner, None);
        let b = folder(owner, Some(a.id));
        let ids = vec![a.id, b.id];

        store.insert(a).await.unwrap();
        store.insert(b).await.unwrap();
        store.remove_many(&ids).await.unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_watch_snapshot_then_event() {
        let store = MemoryFolderStore::new();
        let owner = UserId::new();
        store.insert(folder(owner, None)).await.unwrap();

        let mut feed = store
            .watch(&FolderQuery::AccessibleTo(owner))
            .await
            .unwrap();
        assert_eq!(feed.snapshot.len(), 1);

        store.insert(folder(owner, None)).await.unwrap();
        let event = feed.events.recv().await.unwrap();
        assert!(matches!(event, FolderEvent::Created { owner_id, .. } if owner_id == owner));
    }
}
