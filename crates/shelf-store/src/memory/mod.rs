//! In-memory store implementations for single-node deployments and tests.

pub mod folder;
pub mod notification;

pub use folder::MemoryFolderStore;
pub use notification::MemoryNotificationStore;
