//! # shelf-access
//!
//! The access control engine: pure decision logic that, given a folder and
//! a user, computes view/contribute/administer rights for a viewing
//! context. The engine's only I/O is fetching parent folders while it
//! evaluates inheritance; it keeps no state of its own between calls.
//!
//! Every read and write path in the application consults this one engine,
//! so there is exactly one place where "who can see what" is decided.

pub mod context;
pub mod engine;

pub use context::ViewContext;
pub use engine::{AccessDecision, AccessEngine};
