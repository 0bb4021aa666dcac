//! Mutations: the difference between two snapshots of the same ticket.

use crate::model::{Note, Priority, Resolution, Status, Ticket};

/// The fields a lifecycle operation changed, plus the notes it appended.
///
/// `None` means "leave the stored value alone": a write built from an older
/// snapshot must not put back fields it never touched. Notes only ever grow,
/// so a mutation carries just the new ones and the store appends them after
/// whatever is already persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutation {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub resolution: Option<Resolution>,
    pub appended_notes: Vec<Note>,
}

impl Mutation {
    /// Describes how `after` differs from `before`.
    ///
    /// `after` must have been derived from `before` by the lifecycle engine,
    /// which only ever appends to `notes`.
    pub fn between(before: &Ticket, after: &Ticket) -> Self {
        let appended_notes = after
            .notes
            .get(before.notes.len()..)
            .map(<[Note]>::to_vec)
            .unwrap_or_default();

        Self {
            status: (after.status != before.status).then_some(after.status),
            priority: (after.priority != before.priority).then_some(after.priority),
            resolution: after
                .resolution
                .clone()
                .filter(|_| after.resolution != before.resolution),
            appended_notes,
        }
    }

    /// Whether the mutation would write anything.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.resolution.is_none()
            && self.appended_notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    use crate::lifecycle;
    use crate::model::{Submission, Submitter};

    fn pending() -> Ticket {
        Ticket::new_assistance(
            Submission {
                department: "Motorpool".into(),
                category: "vehicle".into(),
                submitted_by: Submitter {
                    name: "Ana".into(),
                    email: "ana@example.edu".into(),
                },
                subject: "Broken seat".into(),
                body: String::new(),
            },
            Priority::Medium,
            Timestamp::UNIX_EPOCH,
        )
    }

    #[test]
    fn carries_only_new_notes() {
        let first = lifecycle::add_note(&pending(), "one", "admin", Timestamp::UNIX_EPOCH)
            .unwrap()
            .ticket;
        let second = lifecycle::add_note(&first, "two", "admin", Timestamp::UNIX_EPOCH)
            .unwrap()
            .ticket;

        let mutation = Mutation::between(&first, &second);
        assert_eq!(mutation.appended_notes.len(), 1);
        assert_eq!(mutation.appended_notes[0].message, "two");
    }

    #[test]
    fn carries_resolution_and_status() {
        let before = pending();
        let after = lifecycle::resolve(&before, "Seat replaced", "admin", Timestamp::UNIX_EPOCH)
            .unwrap()
            .ticket;

        let mutation = Mutation::between(&before, &after);
        assert_eq!(mutation.status, Some(Status::Resolved));
        assert_eq!(mutation.priority, None);
        assert_eq!(
            mutation.resolution.map(|r| r.message),
            Some("Seat replaced".to_string())
        );
        assert!(mutation.appended_notes.is_empty());
    }

    #[test]
    fn note_leaves_status_and_priority_untouched() {
        let before = pending();
        let after = lifecycle::add_note(&before, "Called Ana", "admin", Timestamp::UNIX_EPOCH)
            .unwrap()
            .ticket;

        let mutation = Mutation::between(&before, &after);
        assert_eq!(mutation.status, None);
        assert_eq!(mutation.priority, None);
        assert_eq!(mutation.resolution, None);
        assert!(!mutation.is_empty());
    }

    #[test]
    fn carries_only_priority() {
        let before = pending();
        let after = lifecycle::set_priority(&before, Priority::Urgent, "admin")
            .unwrap()
            .ticket;

        let mutation = Mutation::between(&before, &after);
        assert_eq!(
            mutation,
            Mutation {
                priority: Some(Priority::Urgent),
                ..Mutation::default()
            }
        );
    }

    #[test]
    fn identical_snapshots_are_empty() {
        let ticket = pending();
        assert!(Mutation::between(&ticket, &ticket).is_empty());
    }
}
