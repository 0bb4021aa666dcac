//! Department scoping: which tickets an admin surface may see.
//!
//! A scope is either the wildcard (the system-admin surface) or a list of
//! matches against the ticket's department. Matching ignores case.
//!
//! In configuration a scope is written as `"*"` or as a list whose entries
//! are either a plain string (substring match) or `{ exact = "..." }`:
//!
//! ```toml
//! [surfaces.merchant]
//! scope = [{ exact = "Merchant Office" }]
//!
//! [surfaces.motorpool]
//! scope = ["motorpool", "shuttle"]
//! ```

use serde::{Deserialize, Serialize};

use crate::model::Ticket;

const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScopeRepr", into = "ScopeRepr")]
pub enum DepartmentScope {
    /// Sees every ticket.
    All,

    /// Sees tickets whose department satisfies at least one match.
    Matching(Vec<DepartmentMatch>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MatchRepr", into = "MatchRepr")]
pub enum DepartmentMatch {
    /// The whole department name, ignoring case.
    Exact(String),

    /// A fragment of the department name, ignoring case.
    Contains(String),
}

impl DepartmentMatch {
    /// A blank pattern matches nothing.
    pub fn matches(&self, department: &str) -> bool {
        let department = department.trim().to_lowercase();
        match self {
            Self::Exact(name) => {
                let name = name.trim().to_lowercase();
                !name.is_empty() && department == name
            }
            Self::Contains(fragment) => {
                let fragment = fragment.trim().to_lowercase();
                !fragment.is_empty() && department.contains(&fragment)
            }
        }
    }
}

impl DepartmentScope {
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Matching(vec![DepartmentMatch::Exact(name.into())])
    }

    pub fn containing<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Matching(
            fragments
                .into_iter()
                .map(|f| DepartmentMatch::Contains(f.into()))
                .collect(),
        )
    }

    pub fn permits(&self, department: &str) -> bool {
        match self {
            Self::All => true,
            Self::Matching(matches) => matches.iter().any(|m| m.matches(department)),
        }
    }

    /// Keeps only the tickets visible under this scope, preserving order.
    pub fn filter<'a>(&self, tickets: &'a [Ticket]) -> Vec<&'a Ticket> {
        tickets.iter().filter(|t| is_visible_to(t, self)).collect()
    }
}

/// Whether a ticket is visible to a surface with the given scope.
pub fn is_visible_to(ticket: &Ticket, scope: &DepartmentScope) -> bool {
    scope.permits(&ticket.department)
}

// ── Config representation ──

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScopeRepr {
    Wildcard(String),
    Matches(Vec<DepartmentMatch>),
}

impl TryFrom<ScopeRepr> for DepartmentScope {
    type Error = String;

    fn try_from(repr: ScopeRepr) -> Result<Self, Self::Error> {
        match repr {
            ScopeRepr::Wildcard(s) if s == WILDCARD => Ok(Self::All),
            ScopeRepr::Wildcard(s) => Err(format!(
                "scope must be \"{WILDCARD}\" or a list of matches, got \"{s}\""
            )),
            ScopeRepr::Matches(matches) => Ok(Self::Matching(matches)),
        }
    }
}

impl From<DepartmentScope> for ScopeRepr {
    fn from(scope: DepartmentScope) -> Self {
        match scope {
            DepartmentScope::All => Self::Wildcard(WILDCARD.to_string()),
            DepartmentScope::Matching(matches) => Self::Matches(matches),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum MatchRepr {
    Contains(String),
    Exact { exact: String },
}

impl From<MatchRepr> for DepartmentMatch {
    fn from(repr: MatchRepr) -> Self {
        match repr {
            MatchRepr::Contains(fragment) => Self::Contains(fragment),
            MatchRepr::Exact { exact } => Self::Exact(exact),
        }
    }
}

impl From<DepartmentMatch> for MatchRepr {
    fn from(m: DepartmentMatch) -> Self {
        match m {
            DepartmentMatch::Contains(fragment) => Self::Contains(fragment),
            DepartmentMatch::Exact(exact) => Self::Exact { exact },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    use crate::model::{Priority, Submission, Submitter};

    fn ticket_for(department: &str) -> Ticket {
        Ticket::new_assistance(
            Submission {
                department: department.into(),
                category: "general".into(),
                submitted_by: Submitter {
                    name: "Ana".into(),
                    email: "ana@example.edu".into(),
                },
                subject: "Help".into(),
                body: String::new(),
            },
            Priority::Low,
            Timestamp::UNIX_EPOCH,
        )
    }

    #[test]
    fn substring_match_ignores_case() {
        let scope = DepartmentScope::containing(["motorpool", "shuttle"]);

        assert!(is_visible_to(&ticket_for("NU Shuttle Service"), &scope));
        assert!(is_visible_to(&ticket_for("MOTORPOOL"), &scope));
        assert!(!is_visible_to(&ticket_for("Merchant Office"), &scope));
    }

    #[test]
    fn exact_match_ignores_case_but_not_extra_words() {
        let scope = DepartmentScope::exact("Merchant Office");

        assert!(is_visible_to(&ticket_for("merchant office"), &scope));
        assert!(!is_visible_to(&ticket_for("Merchant Office Annex"), &scope));
    }

    #[test]
    fn wildcard_sees_everything() {
        for department in ["Merchant Office", "NU Shuttle Service", "", "Registrar"] {
            assert!(is_visible_to(&ticket_for(department), &DepartmentScope::All));
        }
    }

    #[test]
    fn empty_scope_and_blank_patterns_see_nothing() {
        let ticket = ticket_for("Registrar");

        assert!(!is_visible_to(&ticket, &DepartmentScope::Matching(vec![])));
        assert!(!is_visible_to(&ticket, &DepartmentScope::containing([" "])));
        assert!(!is_visible_to(&ticket, &DepartmentScope::exact("")));
    }

    #[test]
    fn filter_preserves_order() {
        let tickets = vec![
            ticket_for("NU Shuttle Service"),
            ticket_for("Merchant Office"),
            ticket_for("Motorpool"),
        ];
        let visible = DepartmentScope::containing(["motorpool", "shuttle"]).filter(&tickets);

        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].department, "NU Shuttle Service");
        assert_eq!(visible[1].department, "Motorpool");
    }

    #[derive(Deserialize)]
    struct Wrapper {
        scope: DepartmentScope,
    }

    #[test]
    fn deserializes_wildcard_and_match_lists() {
        let all: Wrapper = toml::from_str(r#"scope = "*""#).unwrap();
        assert_eq!(all.scope, DepartmentScope::All);

        let mixed: Wrapper =
            toml::from_str(r#"scope = ["shuttle", { exact = "Merchant Office" }]"#).unwrap();
        assert_eq!(
            mixed.scope,
            DepartmentScope::Matching(vec![
                DepartmentMatch::Contains("shuttle".into()),
                DepartmentMatch::Exact("Merchant Office".into()),
            ])
        );
    }

    #[test]
    fn rejects_non_wildcard_string() {
        assert!(toml::from_str::<Wrapper>(r#"scope = "shuttle""#).is_err());
    }
}
