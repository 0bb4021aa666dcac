//! Ticket filters: the criteria an admin surface lists tickets by.

use jiff::Timestamp;

use crate::model::{Status, SubmissionType, Ticket};
use crate::scope::DepartmentScope;

/// Criteria for [`TicketStore::query`](super::TicketStore::query).
///
/// Every field is optional; an empty filter matches every ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub department: Option<DepartmentScope>,
    pub status: Option<Status>,
    pub submission_type: Option<SubmissionType>,

    /// Case-insensitive text matched against subject, body, category,
    /// department, and the submitter's name and email.
    pub search_text: Option<String>,

    /// Inclusive lower bound on `submitted_at`.
    pub submitted_after: Option<Timestamp>,

    /// Exclusive upper bound on `submitted_at`.
    pub submitted_before: Option<Timestamp>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(scope) = &self.department
            && !scope.permits(&ticket.department)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != ticket.status) {
            return false;
        }
        if self
            .submission_type
            .is_some_and(|t| t != ticket.submission_type)
        {
            return false;
        }
        if self.submitted_after.is_some_and(|t| ticket.submitted_at < t) {
            return false;
        }
        if self.submitted_before.is_some_and(|t| ticket.submitted_at >= t) {
            return false;
        }
        match self.search_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => matches_text(ticket, &text.to_lowercase()),
            _ => true,
        }
    }
}

fn matches_text(ticket: &Ticket, needle: &str) -> bool {
    [
        ticket.subject.as_str(),
        ticket.body.as_str(),
        ticket.category.as_str(),
        ticket.department.as_str(),
        ticket.submitted_by.name.as_str(),
        ticket.submitted_by.email.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::SignedDuration;

    use crate::model::{Priority, Rating, Submission, Submitter};

    fn epoch_plus(days: i64) -> Timestamp {
        Timestamp::UNIX_EPOCH + SignedDuration::from_hours(24 * days)
    }

    fn submission() -> Submission {
        Submission {
            department: "Merchant Office".into(),
            category: "refund".into(),
            submitted_by: Submitter {
                name: "Ben Cruz".into(),
                email: "ben@example.edu".into(),
            },
            subject: "Double charge".into(),
            body: "Charged twice at the canteen.".into(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let ticket = Ticket::new_assistance(submission(), Priority::Low, epoch_plus(1));
        assert!(TicketFilter::default().matches(&ticket));
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let ticket = Ticket::new_assistance(submission(), Priority::Low, epoch_plus(1));

        for text in ["CANTEEN", "refund", "ben@", "merchant", "  double  "] {
            let filter = TicketFilter {
                search_text: Some(text.into()),
                ..Default::default()
            };
            assert!(filter.matches(&ticket), "{text}");
        }

        let filter = TicketFilter {
            search_text: Some("shuttle".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&ticket));
    }

    #[test]
    fn date_range_is_half_open() {
        let ticket = Ticket::new_assistance(submission(), Priority::Low, epoch_plus(5));
        let range = |after, before| TicketFilter {
            submitted_after: Some(epoch_plus(after)),
            submitted_before: Some(epoch_plus(before)),
            ..Default::default()
        };

        assert!(range(5, 6).matches(&ticket));
        assert!(!range(4, 5).matches(&ticket));
        assert!(!range(6, 7).matches(&ticket));
    }

    #[test]
    fn status_type_and_department_narrow_results() {
        let assistance = Ticket::new_assistance(submission(), Priority::Low, epoch_plus(1));
        let feedback = Ticket::new_feedback(submission(), Rating::new(5).unwrap(), epoch_plus(1));

        let only_feedback = TicketFilter {
            submission_type: Some(SubmissionType::Feedback),
            ..Default::default()
        };
        assert!(!only_feedback.matches(&assistance));
        assert!(only_feedback.matches(&feedback));

        let only_resolved = TicketFilter {
            status: Some(Status::Resolved),
            ..Default::default()
        };
        assert!(!only_resolved.matches(&assistance));

        let motorpool = TicketFilter {
            department: Some(DepartmentScope::containing(["motorpool", "shuttle"])),
            ..Default::default()
        };
        assert!(!motorpool.matches(&assistance));
    }
}
