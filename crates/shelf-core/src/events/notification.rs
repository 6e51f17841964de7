//! Contributor-notification domain events.

use serde::{Deserialize, Serialize};

use crate::types::id::{NotificationId, UserId};

/// Events emitted by the notification store on record mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationEvent {
    /// A notification record was created.
    Created {
        /// The new notification's ID.
        notification_id: NotificationId,
        /// The recipient the record was addressed to.
        recipient_id: UserId,
    },
    /// A notification record was updated (read-state change).
    Updated {
        /// The updated notification's ID.
        notification_id: NotificationId,
        /// The recipient of the record.
        recipient_id: UserId,
    },
    /// A notification record was deleted.
    Deleted {
        /// The deleted notification's ID.
        notification_id: NotificationId,
        /// The recipient of the record.
        recipient_id: UserId,
    },
}

impl NotificationEvent {
    /// The recipient whose notification list is affected by this event.
    pub fn recipient_id(&self) -> UserId {
        match self {
            Self::Created { recipient_id, .. }
            | Self::Updated { recipient_id, .. }
            | Self::Deleted { recipient_id, .. } => *recipient_id,
        }
    }
}
