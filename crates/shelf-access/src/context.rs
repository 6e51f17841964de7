//! Viewing contexts for permission evaluation.

use serde::{Deserialize, Serialize};

use shelf_core::types::id::FolderId;

/// The context a folder is being viewed in.
///
/// The same folder can be visible in one context and hidden in another:
/// a foreign public folder is openable from the public catalog but must
/// never show up in a user's personal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewContext {
    /// The user's own folder list: folders they own or contribute to.
    /// Public visibility alone grants nothing here.
    PersonalLibrary,
    /// Children listed inside a folder the user was already permitted to
    /// open; parent inheritance applies.
    FolderChildren(FolderId),
    /// The global catalog of public folders.
    PublicCatalog,
}

impl ViewContext {
    /// Whether this context honors inheritance from ancestor folders.
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::FolderChildren(_))
    }
}
