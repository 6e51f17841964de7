//! Domain events emitted by the folder and notification stores.
//!
//! Change feeds carry these events; consumers re-query the store for the
//! current result set of their subscription rather than applying diffs.

pub mod folder;
pub mod notification;

pub use folder::FolderEvent;
pub use notification::NotificationEvent;
