//! Notification intents: what happened to a ticket, addressed to its submitter.
//!
//! An intent describes an outbound notification without sending it.
//! Dispatch belongs to a [`NotificationDispatcher`](crate::notify::NotificationDispatcher).

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ticket::{Status, Submitter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationIntent {
    pub ticket_id: Uuid,
    pub recipient: Submitter,
    pub payload: IntentPayload,
}

impl NotificationIntent {
    pub fn kind(&self) -> IntentKind {
        match self.payload {
            IntentPayload::StatusChanged { .. } => IntentKind::StatusChanged,
            IntentPayload::Resolved { .. } => IntentKind::Resolved,
            IntentPayload::NoteAdded { .. } => IntentKind::NoteAdded,
        }
    }
}

/// What the dispatcher needs to write the message body.
///
/// Tagged so each outbox line is self-describing when read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IntentPayload {
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        from: Status,
        to: Status,
        changed_by: String,
        changed_at: Timestamp,
    },

    /// Carries the resolution text; the user-facing email must include it.
    #[serde(rename_all = "camelCase")]
    Resolved {
        message: String,
        resolved_by: String,
        resolved_at: Timestamp,
    },

    #[serde(rename_all = "camelCase")]
    NoteAdded {
        message: String,
        admin_name: String,
        added_at: Timestamp,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    StatusChanged,
    Resolved,
    NoteAdded,
}
