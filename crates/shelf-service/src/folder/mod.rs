//! Folder read and write surfaces.

pub mod gateway;
pub mod repository;

pub use gateway::{CreateFolderRequest, MutationGateway};
pub use repository::FolderRepository;
