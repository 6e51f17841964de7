//! Shared type definitions.

pub mod id;
pub mod pagination;

pub use id::{FolderId, NotificationId, UserId};
pub use pagination::PageRequest;
