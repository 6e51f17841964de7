//! # shelf-entity
//!
//! Domain entity models for Shelfshare: folders, contributor
//! notifications, and user profiles. Entities are plain serde structs; the
//! persisted record layout is exactly these shapes, one record per entity
//! in a schemaless keyed collection.

pub mod folder;
pub mod notification;
pub mod user;

pub use folder::{CreateFolder, Folder};
pub use notification::{ContributorChange, ContributorNotification};
pub use user::UserProfile;
