//! Core data model for concern tickets.
//!
//! Tickets, their audit trail, and the notification intents the
//! lifecycle engine emits when a ticket changes.

mod intent;
mod ticket;

pub use intent::{IntentKind, IntentPayload, NotificationIntent};
pub use ticket::{
    Note, ParseEnumError, Priority, Rating, Resolution, Status, SubmissionType, Submission,
    Submitter, Ticket,
};
