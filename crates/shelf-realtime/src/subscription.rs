//! Live folder stream handles.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use shelf_entity::folder::Folder;
use shelf_store::query::FolderQuery;

use crate::hub::FeedHub;

/// A live folder stream for one subscriber.
///
/// Each received item is the full current result set for the subscriber's
/// scope. Release is explicit via [`FolderSubscription::unsubscribe`];
/// dropping the handle releases too. There is no server-side idle
/// eviction: abandoned subscriptions are the caller's responsibility.
pub struct FolderSubscription {
    /// Hub to notify on release.
    hub: Arc<FeedHub>,
    /// The query shape this subscription shares an upstream with.
    query: FolderQuery,
    /// Filtered emissions.
    rx: mpsc::Receiver<Vec<Folder>>,
    /// The subscriber pump task.
    task: JoinHandle<()>,
    /// Guard against double release.
    released: bool,
}

impl FolderSubscription {
    pub(crate) fn new(
        hub: Arc<FeedHub>,
        query: FolderQuery,
        rx: mpsc::Receiver<Vec<Folder>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            hub,
            query,
            rx,
            task,
            released: false,
        }
    }

    /// Wait for the next emission. Returns `None` once the subscription
    /// has been released.
    pub async fn recv(&mut self) -> Option<Vec<Folder>> {
        self.rx.recv().await
    }

    /// Explicitly release the subscription.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.task.abort();
            self.hub.release(&self.query);
        }
    }
}

impl std::fmt::Debug for FolderSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderSubscription")
            .field("query", &self.query)
            .finish()
    }
}

impl Drop for FolderSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
