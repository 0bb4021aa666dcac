//! Lifecycle engine: the only code allowed to change a ticket's status,
//! notes, resolution, or priority.
//!
//! Every operation is a pure function of a ticket snapshot plus explicit
//! actor and clock arguments. It returns a new snapshot and at most one
//! notification intent, or an error and no change at all. Persisting the
//! snapshot and dispatching the intent belong to the caller; see
//! [`Desk`](crate::desk::Desk).
//!
//! ```text
//! pending ──▶ in_progress ──▶ resolved
//!    │             │
//!    └──▶ closed ◀─┘
//! ```
//!
//! `resolve` is accepted from any unresolved state, since it only needs a
//! message. Feedback tickets have no lifecycle: they are never mutated here.

use std::fmt;

use jiff::Timestamp;

use crate::model::{
    IntentPayload, Note, NotificationIntent, Priority, Resolution, Status, SubmissionType, Ticket,
};

/// Errors returned by lifecycle operations. Neither variant mutates anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Required text was missing or blank.
    #[error("{0}")]
    Validation(String),

    /// The ticket's current state forbids the operation.
    #[error("cannot {action} this {submission_type} ticket (status: {status}): {reason}")]
    InvalidTransition {
        action: Action,
        submission_type: SubmissionType,
        status: Status,
        reason: &'static str,
    },
}

pub type Result<T> = core::result::Result<T, LifecycleError>;

/// The lifecycle operations, named for error messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    OpenForReview,
    SetStatus(Status),
    Resolve,
    AddNote,
    SetPriority,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenForReview => f.write_str("open"),
            Self::SetStatus(to) => write!(f, "move to {to}"),
            Self::Resolve => f.write_str("resolve"),
            Self::AddNote => f.write_str("add a note to"),
            Self::SetPriority => f.write_str("reprioritize"),
        }
    }
}

/// The result of a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The ticket after the operation. Equal to the input when unchanged.
    pub ticket: Ticket,

    /// Set for every change the submitter is told about.
    pub intent: Option<NotificationIntent>,

    changed: bool,
}

impl Transition {
    fn unchanged(ticket: &Ticket) -> Self {
        Self {
            ticket: ticket.clone(),
            intent: None,
            changed: false,
        }
    }

    fn changed(ticket: Ticket, intent: Option<NotificationIntent>) -> Self {
        Self {
            ticket,
            intent,
            changed: true,
        }
    }

    /// Whether the snapshot differs from the input and needs persisting.
    pub fn is_noop(&self) -> bool {
        !self.changed
    }
}

/// Marks a pending ticket as being worked on because an admin opened it.
///
/// Anything other than a pending assistance ticket is returned unchanged
/// with no intent, so repeated views never re-notify. The actor is only
/// checked when the view changes the ticket, since only then is it recorded.
pub fn open_for_review(ticket: &Ticket, actor: &str, now: Timestamp) -> Result<Transition> {
    if ticket.is_feedback() || ticket.status != Status::Pending {
        return Ok(Transition::unchanged(ticket));
    }
    require_text("actor", actor)?;
    Ok(move_to(ticket, Status::InProgress, actor, now))
}

/// Sets the status directly. Only `in_progress` and `closed` are accepted;
/// resolving has its own operation because it needs a message.
///
/// Setting the status the ticket already has is a no-op.
pub fn set_status(
    ticket: &Ticket,
    new_status: Status,
    actor: &str,
    now: Timestamp,
) -> Result<Transition> {
    let action = Action::SetStatus(new_status);
    require_assistance(ticket, action)?;
    require_text("actor", actor)?;

    if ticket.status == Status::Resolved {
        return Err(invalid(ticket, action, "resolved tickets are final"));
    }
    match new_status {
        Status::InProgress | Status::Closed => {}
        Status::Resolved => {
            return Err(invalid(ticket, action, "resolving requires a resolution message"));
        }
        Status::Pending => {
            return Err(invalid(ticket, action, "tickets never return to pending"));
        }
    }
    if new_status == ticket.status {
        return Ok(Transition::unchanged(ticket));
    }
    if ticket.status == Status::Closed {
        return Err(invalid(ticket, action, "closed tickets cannot be reopened"));
    }

    Ok(move_to(ticket, new_status, actor, now))
}

/// Resolves the ticket with a mandatory message.
///
/// Resolution is applied once: a resolved ticket cannot be resolved again.
pub fn resolve(ticket: &Ticket, message: &str, actor: &str, now: Timestamp) -> Result<Transition> {
    require_assistance(ticket, Action::Resolve)?;
    if ticket.status == Status::Resolved {
        return Err(invalid(ticket, Action::Resolve, "it is already resolved"));
    }
    require_text("resolution message", message)?;
    require_text("actor", actor)?;

    let mut next = ticket.clone();
    next.status = Status::Resolved;
    next.resolution = Some(Resolution {
        message: message.to_string(),
        resolved_by: actor.to_string(),
        resolved_at: now,
    });

    let intent = intent_for(
        ticket,
        IntentPayload::Resolved {
            message: message.to_string(),
            resolved_by: actor.to_string(),
            resolved_at: now,
        },
    );
    Ok(Transition::changed(next, Some(intent)))
}

/// Appends a note to the audit trail.
///
/// Resolved tickets take no further notes: the resolution is the final word.
pub fn add_note(ticket: &Ticket, message: &str, actor: &str, now: Timestamp) -> Result<Transition> {
    require_assistance(ticket, Action::AddNote)?;
    if ticket.status == Status::Resolved {
        return Err(invalid(
            ticket,
            Action::AddNote,
            "the resolution is the final word",
        ));
    }
    require_text("note", message)?;
    require_text("actor", actor)?;

    let mut next = ticket.clone();
    next.notes.push(Note {
        admin_name: actor.to_string(),
        message: message.to_string(),
        timestamp: now,
    });

    let intent = intent_for(
        ticket,
        IntentPayload::NoteAdded {
            message: message.to_string(),
            admin_name: actor.to_string(),
            added_at: now,
        },
    );
    Ok(Transition::changed(next, Some(intent)))
}

/// Changes the priority of an open assistance ticket.
///
/// Priority is internal triage: the submitter is not notified.
pub fn set_priority(ticket: &Ticket, priority: Priority, actor: &str) -> Result<Transition> {
    require_assistance(ticket, Action::SetPriority)?;
    require_text("actor", actor)?;
    if matches!(ticket.status, Status::Resolved | Status::Closed) {
        return Err(invalid(
            ticket,
            Action::SetPriority,
            "only open tickets can be reprioritized",
        ));
    }
    if ticket.priority == priority {
        return Ok(Transition::unchanged(ticket));
    }

    let mut next = ticket.clone();
    next.priority = priority;
    Ok(Transition::changed(next, None))
}

fn move_to(ticket: &Ticket, to: Status, actor: &str, now: Timestamp) -> Transition {
    let mut next = ticket.clone();
    next.status = to;

    let intent = intent_for(
        ticket,
        IntentPayload::StatusChanged {
            from: ticket.status,
            to,
            changed_by: actor.to_string(),
            changed_at: now,
        },
    );
    Transition::changed(next, Some(intent))
}

fn intent_for(ticket: &Ticket, payload: IntentPayload) -> NotificationIntent {
    NotificationIntent {
        ticket_id: ticket.id,
        recipient: ticket.submitted_by.clone(),
        payload,
    }
}

fn require_assistance(ticket: &Ticket, action: Action) -> Result<()> {
    if ticket.is_feedback() {
        return Err(invalid(ticket, action, "feedback has no lifecycle"));
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LifecycleError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn invalid(ticket: &Ticket, action: Action, reason: &'static str) -> LifecycleError {
    LifecycleError::InvalidTransition {
        action,
        submission_type: ticket.submission_type,
        status: ticket.status,
        reason,
    }
}
