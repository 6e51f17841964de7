//! User profile model resolved from the external profile collaborator.

use serde::{Deserialize, Serialize};

use shelf_core::types::id::UserId;

/// A resolved user profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's ID.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Avatar image URL, if the user has one.
    pub avatar_url: Option<String>,
}
