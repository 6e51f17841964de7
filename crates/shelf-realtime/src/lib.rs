//! # shelf-realtime
//!
//! Live-stream orchestration. Each distinct query shape gets exactly one
//! upstream change feed against the store, fanned out to any number of
//! local subscribers. Every subscriber emission is the full current result
//! set for its viewing scope, re-filtered through the access engine; no
//! diffs are sent.
//!
//! Subscriptions are released explicitly (or on drop); the last release of
//! a query shape tears its upstream feed down. Upstream feeds re-establish
//! themselves after transient store failures without the caller
//! resubscribing.

pub mod hub;
pub mod notify;
pub mod scope;
pub mod subscription;

pub use hub::FeedHub;
pub use notify::{NotificationFeedHub, NotificationSubscription};
pub use scope::StreamScope;
pub use subscription::FolderSubscription;
