//! Ticket types: the unit of work tracked by the lifecycle engine.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-submitted assistance request or feedback item.
///
/// Tickets are values. The lifecycle engine never mutates one in place;
/// every operation returns a new snapshot that the caller persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,

    /// Fixed at creation. Decides whether the ticket has a lifecycle at all.
    pub submission_type: SubmissionType,

    /// Only meaningful for assistance tickets.
    pub status: Status,

    /// The office the ticket is reported to, e.g. "Merchant Office".
    pub department: String,

    pub priority: Priority,

    /// Free-form classification tag chosen by the submitter.
    pub category: String,

    /// Present only on feedback tickets.
    pub rating: Option<Rating>,

    /// Who raised the ticket. Notification intents are addressed here.
    pub submitted_by: Submitter,

    pub subject: String,

    pub body: String,

    /// Anchor for aging. Never changes.
    pub submitted_at: Timestamp,

    /// Admin notes in the order they were written.
    pub notes: Vec<Note>,

    /// Set exactly once, together with `status = resolved`.
    pub resolution: Option<Resolution>,
}

/// Fields supplied by whoever raises a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub department: String,
    pub category: String,
    pub submitted_by: Submitter,
    pub subject: String,
    pub body: String,
}

impl Ticket {
    /// Creates a pending assistance ticket.
    pub fn new_assistance(submission: Submission, priority: Priority, submitted_at: Timestamp) -> Self {
        Self::from_submission(submission, SubmissionType::Assistance, priority, None, submitted_at)
    }

    /// Creates a feedback ticket. Feedback never moves through the lifecycle.
    pub fn new_feedback(submission: Submission, rating: Rating, submitted_at: Timestamp) -> Self {
        Self::from_submission(
            submission,
            SubmissionType::Feedback,
            Priority::Low,
            Some(rating),
            submitted_at,
        )
    }

    fn from_submission(
        submission: Submission,
        submission_type: SubmissionType,
        priority: Priority,
        rating: Option<Rating>,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            submission_type,
            status: Status::Pending,
            department: submission.department,
            priority,
            category: submission.category,
            rating,
            submitted_by: submission.submitted_by,
            subject: submission.subject,
            body: submission.body,
            submitted_at,
            notes: Vec::new(),
            resolution: None,
        }
    }

    pub fn is_feedback(&self) -> bool {
        self.submission_type == SubmissionType::Feedback
    }

    /// First eight characters of the id, for display and prefix lookup.
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

/// Contact details of the person who raised a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitter {
    pub name: String,
    pub email: String,
}

/// One entry in a ticket's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub admin_name: String,
    pub message: String,
    pub timestamp: Timestamp,
}

/// The final word on a resolved ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub message: String,
    pub resolved_by: String,
    pub resolved_at: Timestamp,
}

/// A feedback score between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Returns `None` when the value is outside 1–5.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!(
                "rating must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Returned when a stored or typed enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Implements `as_str`, `Display` and `FromStr` over the snake_case names
/// that are also used on the wire and in the database.
macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionType {
    /// A request for help. Has a lifecycle.
    Assistance,

    /// A rating with comments. Informational only.
    Feedback,
}

string_enum!(SubmissionType, "submission type", {
    Assistance => "assistance",
    Feedback => "feedback",
});

/// Where an assistance ticket stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,

    /// Terminal. Carries a resolution message.
    Resolved,

    /// Administrative escape hatch.
    Closed,
}

string_enum!(Status, "status", {
    Pending => "pending",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Urgent,
}

string_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> Submission {
        Submission {
            department: "NU Shuttle Service".into(),
            category: "schedule".into(),
            submitted_by: Submitter {
                name: "Ana Reyes".into(),
                email: "ana@example.edu".into(),
            },
            subject: "Shuttle late".into(),
            body: "The 8am shuttle never arrived.".into(),
        }
    }

    #[test]
    fn new_assistance_starts_pending_without_rating() {
        let ticket = Ticket::new_assistance(submission(), Priority::High, Timestamp::UNIX_EPOCH);

        assert_eq!(ticket.status, Status::Pending);
        assert_eq!(ticket.priority, Priority::High);
        assert!(ticket.rating.is_none());
        assert!(ticket.notes.is_empty());
        assert!(ticket.resolution.is_none());
    }

    #[test]
    fn new_feedback_carries_rating_and_low_priority() {
        let rating = Rating::new(4).unwrap();
        let ticket = Ticket::new_feedback(submission(), rating, Timestamp::UNIX_EPOCH);

        assert!(ticket.is_feedback());
        assert_eq!(ticket.rating.map(Rating::get), Some(4));
        assert_eq!(ticket.priority, Priority::Low);
    }

    #[test]
    fn rating_rejects_out_of_range() {
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
        assert!(Rating::new(1).is_some());
        assert!(Rating::new(5).is_some());
    }

    #[test]
    fn rating_deserialization_is_checked() {
        assert!(serde_json::from_str::<Rating>("3").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn status_names_match_serde() {
        for status in [
            Status::Pending,
            Status::InProgress,
            Status::Resolved,
            Status::Closed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        let err = "reopened".parse::<Status>().unwrap_err();
        assert_eq!(err.to_string(), "unknown status: reopened");
    }
}
