//! # shelf-store
//!
//! The Folder Store boundary: async trait interfaces over a document
//! database with composite-filter queries and change feeds, plus in-memory
//! implementations for single-node deployments and tests.
//!
//! The store is the single source of truth; nothing above it caches folder
//! state beyond the lifetime of one query or subscription.

pub mod memory;
pub mod query;
pub mod store;

pub use memory::{MemoryFolderStore, MemoryNotificationStore};
pub use query::FolderQuery;
pub use store::{FolderFeed, FolderStore, NotificationFeed, NotificationStore};
