//! Contributor notification dispatch and lifecycle.

pub mod dispatcher;

pub use dispatcher::ContributorNotificationDispatcher;
