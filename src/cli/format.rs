//! Output formatting for CLI display.

use jiff::Timestamp;

use concerns::aging::{self, Severity};
use concerns::desk::Outcome;
use concerns::model::{IntentPayload, Ticket};
use concerns::notify::OutboxEntry;

/// One line per ticket: id, state, age, department, subject.
pub(super) fn format_row(ticket: &Ticket, now: Timestamp) -> String {
    let state = match ticket.rating {
        Some(rating) => format!("feedback {}/5", rating.get()),
        None => format!("{}, {}", ticket.status, ticket.priority),
    };
    let age = aging::classify(ticket, now)
        .map(|a| format!("  {}", badge(&a.label, a.severity)))
        .unwrap_or_default();
    format!(
        "{}  [{state}]{age}  {}  {}",
        ticket.short_id(),
        ticket.department,
        ticket.subject
    )
}

/// Full ticket view. Notes are listed newest first.
pub(super) fn format_detail(ticket: &Ticket, now: Timestamp) -> String {
    let mut lines = vec![
        format!("Ticket   {}", ticket.id),
        format!("Type     {}", ticket.submission_type),
    ];
    match ticket.rating {
        Some(rating) => lines.push(format!("Rating   {}/5", rating.get())),
        None => {
            lines.push(format!("Status   {}", ticket.status));
            lines.push(format!("Priority {}", ticket.priority));
        }
    }
    if let Some(a) = aging::classify(ticket, now) {
        lines.push(format!("Age      {}", badge(&a.label, a.severity)));
    }
    lines.extend([
        format!("Dept     {}", ticket.department),
        format!("Category {}", ticket.category),
        format!(
            "From     {} <{}>",
            ticket.submitted_by.name, ticket.submitted_by.email
        ),
        format!("Sent     {}", ticket.submitted_at),
        String::new(),
        ticket.subject.clone(),
    ]);
    if !ticket.body.is_empty() {
        lines.push(ticket.body.clone());
    }

    if let Some(r) = &ticket.resolution {
        lines.push(String::new());
        lines.push(format!("Resolved by {} at {}:", r.resolved_by, r.resolved_at));
        lines.push(format!("  {}", r.message));
    }

    if !ticket.notes.is_empty() {
        lines.push(String::new());
        lines.push(format!("Notes ({}):", ticket.notes.len()));
        lines.extend(ticket.notes.iter().rev().map(|note| {
            format!("  {}  {}: {}", note.timestamp, note.admin_name, note.message)
        }));
    }

    lines.join("\n")
}

/// What a committed change did, e.g. `a3b0fc12: pending → in_progress`.
pub(super) fn format_change(outcome: &Outcome) -> String {
    let id = outcome.ticket.short_id();
    match outcome.intent.as_ref().map(|i| &i.payload) {
        Some(IntentPayload::StatusChanged { from, to, .. }) => format!("{id}: {from} → {to}"),
        Some(IntentPayload::Resolved { .. }) => format!("{id}: resolved"),
        Some(IntentPayload::NoteAdded { .. }) => format!("{id}: note added"),
        None => format!("{id}: priority {}", outcome.ticket.priority),
    }
}

pub(super) fn format_outbox_entry(entry: &OutboxEntry) -> String {
    let intent = &entry.intent;
    let what = match &intent.payload {
        IntentPayload::StatusChanged { from, to, .. } => format!("status {from} → {to}"),
        IntentPayload::Resolved { message, .. } => format!("resolved: {message}"),
        IntentPayload::NoteAdded { message, .. } => format!("note: {message}"),
    };
    format!(
        "{}  {}  {}  {what}",
        entry.queued_at,
        &intent.ticket_id.to_string()[..8],
        intent.recipient.email
    )
}

fn badge(label: &str, severity: Severity) -> String {
    let marker = match severity {
        Severity::Lowest | Severity::Low => "",
        Severity::Medium => "!",
        Severity::High => "!!",
        Severity::Critical => "!!!",
    };
    format!("({label}{marker})")
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::SignedDuration;

    use concerns::model::{Note, Priority, Rating, Resolution, Status, Submission, Submitter};

    fn now() -> Timestamp {
        Timestamp::from_second(1_760_000_000).unwrap()
    }

    fn submission() -> Submission {
        Submission {
            department: "NU Shuttle Service".into(),
            category: "schedule".into(),
            submitted_by: Submitter {
                name: "Ana Reyes".into(),
                email: "ana@example.edu".into(),
            },
            subject: "Shuttle late".into(),
            body: String::new(),
        }
    }

    #[test]
    fn row_shows_aging_badge() {
        let ticket = Ticket::new_assistance(
            submission(),
            Priority::High,
            now() - SignedDuration::from_hours(24 * 8),
        );
        let row = format_row(&ticket, now());

        assert!(row.contains("[pending, high]"));
        assert!(row.contains("(8d old!!!)"));
        assert!(row.ends_with("NU Shuttle Service  Shuttle late"));
    }

    #[test]
    fn feedback_row_shows_rating_without_age() {
        let ticket = Ticket::new_feedback(submission(), Rating::new(4).unwrap(), now());
        let row = format_row(&ticket, now());

        assert!(row.contains("[feedback 4/5]"));
        assert!(!row.contains("New"));
    }

    #[test]
    fn detail_lists_notes_newest_first() {
        let mut ticket = Ticket::new_assistance(submission(), Priority::Low, now());
        for message in ["first", "second"] {
            ticket.notes.push(Note {
                admin_name: "admin".into(),
                message: message.into(),
                timestamp: now(),
            });
        }
        let detail = format_detail(&ticket, now());

        let first = detail.find("admin: first").unwrap();
        let second = detail.find("admin: second").unwrap();
        assert!(second < first);
    }

    #[test]
    fn detail_shows_resolution_and_status() {
        let mut ticket = Ticket::new_assistance(submission(), Priority::Urgent, now());
        ticket.status = Status::Resolved;
        ticket.resolution = Some(Resolution {
            message: "Schedule fixed".into(),
            resolved_by: "jdelacruz".into(),
            resolved_at: now(),
        });
        let detail = format_detail(&ticket, now());

        assert!(detail.starts_with(&format!("Ticket   {}\n", ticket.id)));
        assert!(detail.contains("Status   resolved\nPriority urgent"));
        assert!(!detail.contains("Age"));
        assert!(detail.ends_with(
            "Resolved by jdelacruz at 2025-10-09T08:53:20Z:\n  Schedule fixed"
        ));
    }
}
