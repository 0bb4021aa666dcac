//! Aging: how long an open assistance ticket has been waiting.
//!
//! Pure and deterministic for a given `(ticket, now)`, so it is safe to call
//! on every render or poll tick.

use jiff::Timestamp;
use serde::Serialize;

use crate::model::{Status, SubmissionType, Ticket};

const SECONDS_PER_DAY: i64 = 86_400;

/// Urgency bucket for an aging ticket, lowest first.
///
/// Mapping severities to colors is left to whoever renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Lowest,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Half-open day intervals: `[0,1) [1,3) [3,5) [5,7) [7,∞)`.
    fn for_age(age_in_days: u64) -> Self {
        match age_in_days {
            0 => Self::Lowest,
            1..3 => Self::Low,
            3..5 => Self::Medium,
            5..7 => Self::High,
            _ => Self::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aging {
    pub age_in_days: u64,
    pub label: String,
    pub severity: Severity,
}

/// Classifies an open assistance ticket by age.
///
/// Returns `None` for feedback and for resolved tickets: neither ages.
/// Age is whole elapsed days, truncated, so a ticket submitted 23h59m ago is
/// still "New". A submission time after `now` counts as age zero.
pub fn classify(ticket: &Ticket, now: Timestamp) -> Option<Aging> {
    if ticket.submission_type != SubmissionType::Assistance || ticket.status == Status::Resolved {
        return None;
    }

    let age_in_days = age_in_days(ticket.submitted_at, now);
    let severity = Severity::for_age(age_in_days);
    let label = match severity {
        Severity::Lowest => "New".to_string(),
        _ => format!("{age_in_days}d old"),
    };

    Some(Aging {
        age_in_days,
        label,
        severity,
    })
}

fn age_in_days(submitted_at: Timestamp, now: Timestamp) -> u64 {
    let elapsed = now.duration_since(submitted_at).as_secs();
    u64::try_from(elapsed / SECONDS_PER_DAY).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::SignedDuration;

    use crate::model::{Priority, Rating, Submission, Submitter};

    const NOW: i64 = 1_760_000_000;

    fn now() -> Timestamp {
        Timestamp::from_second(NOW).unwrap()
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
            body: "I was charged twice at the canteen.".into(),
        }
    }

    fn submitted_ago(age: SignedDuration) -> Ticket {
        Ticket::new_assistance(submission(), Priority::Low, now() - age)
    }

    fn days(n: i64) -> SignedDuration {
        SignedDuration::from_secs(n * SECONDS_PER_DAY)
    }

    #[test]
    fn fresh_ticket_is_new() {
        let aging = classify(&submitted_ago(SignedDuration::from_mins(5)), now()).unwrap();

        assert_eq!(aging.age_in_days, 0);
        assert_eq!(aging.label, "New");
        assert_eq!(aging.severity, Severity::Lowest);
    }

    #[test]
    fn age_truncates_rather_than_rounds() {
        let age = days(1) - SignedDuration::from_secs(60);
        let aging = classify(&submitted_ago(age), now()).unwrap();

        assert_eq!(aging.age_in_days, 0);
        assert_eq!(aging.severity, Severity::Lowest);
    }

    #[test]
    fn exact_boundaries_fall_into_the_next_bucket() {
        let cases = [
            (1, Severity::Low),
            (3, Severity::Medium),
            (5, Severity::High),
            (7, Severity::Critical),
        ];
        for (n, expected) in cases {
            let aging = classify(&submitted_ago(days(n)), now()).unwrap();
            assert_eq!(aging.severity, expected, "{n} days");
            assert_eq!(aging.label, format!("{n}d old"));
        }
    }

    #[test]
    fn just_below_boundaries_stay_in_the_lower_bucket() {
        let cases = [
            (3, Severity::Low),
            (5, Severity::Medium),
            (7, Severity::High),
        ];
        for (n, expected) in cases {
            let age = days(n) - SignedDuration::from_secs(1);
            let aging = classify(&submitted_ago(age), now()).unwrap();
            assert_eq!(aging.severity, expected, "just under {n} days");
        }
    }

    #[test]
    fn old_tickets_stay_critical() {
        let aging = classify(&submitted_ago(days(45)), now()).unwrap();

        assert_eq!(aging.label, "45d old");
        assert_eq!(aging.severity, Severity::Critical);
    }

    #[test]
    fn resolved_tickets_do_not_age() {
        for n in [0, 2, 4, 6, 30] {
            let mut ticket = submitted_ago(days(n));
            ticket.status = Status::Resolved;
            assert!(classify(&ticket, now()).is_none());
        }
    }

    #[test]
    fn feedback_does_not_age() {
        for n in [0, 2, 4, 6, 30] {
            let ticket = Ticket::new_feedback(submission(), Rating::new(2).unwrap(), now() - days(n));
            assert!(classify(&ticket, now()).is_none());
        }
    }

    #[test]
    fn closed_and_in_progress_tickets_still_age() {
        let mut ticket = submitted_ago(days(4));
        ticket.status = Status::InProgress;
        assert_eq!(classify(&ticket, now()).unwrap().severity, Severity::Medium);

        ticket.status = Status::Closed;
        assert_eq!(classify(&ticket, now()).unwrap().severity, Severity::Medium);
    }

    #[test]
    fn future_submission_counts_as_new() {
        let ticket = Ticket::new_assistance(submission(), Priority::Low, now() + days(2));
        let aging = classify(&ticket, now()).unwrap();

        assert_eq!(aging.age_in_days, 0);
        assert_eq!(aging.label, "New");
    }

    #[test]
    fn classification_is_deterministic() {
        let ticket = submitted_ago(days(3));
        assert_eq!(classify(&ticket, now()), classify(&ticket, now()));
    }

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::Lowest < Severity::Low);
        assert!(Severity::High < Severity::Critical);
    }
}
