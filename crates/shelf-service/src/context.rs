//! Per-request context.

use serde::{Deserialize, Serialize};

use shelf_core::types::id::UserId;

/// Identity of the authenticated caller for one operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user.
    pub user_id: UserId,
}

impl RequestContext {
    /// Creates a context for a user.
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
