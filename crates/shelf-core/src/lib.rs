//! # shelf-core
//!
//! Core crate for Shelfshare. Contains configuration schemas, typed
//! identifiers, domain events, pagination types, the unified error system,
//! and the bounded-retry helper used at the store boundary.
//!
//! This crate has **no** internal dependencies on other Shelfshare crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod retry;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
