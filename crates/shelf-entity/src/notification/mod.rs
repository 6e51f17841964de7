//! Contributor notification entity.

pub mod model;

pub use model::{ContributorChange, ContributorNotification};
