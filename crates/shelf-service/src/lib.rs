//! # shelf-service
//!
//! The application surface: folder reads (`FolderRepository`), folder
//! writes (`MutationGateway`), and the contributor notification surface
//! (`ContributorNotificationDispatcher`). Every operation consults the
//! access engine before touching the store, and transient store failures
//! are retried with bounded backoff at this boundary.

pub mod collab;
pub mod context;
pub mod folder;
pub mod notification;

pub use collab::{MediaCollaborator, ProfileProvider, PushTransport};
pub use context::RequestContext;
pub use folder::gateway::{CreateFolderRequest, MutationGateway};
pub use folder::repository::FolderRepository;
pub use notification::dispatcher::ContributorNotificationDispatcher;
