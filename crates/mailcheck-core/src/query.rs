//! Protocol-agnostic search queries.

use chrono::{DateTime, Utc};

use crate::Rule;

/// A bounded search for one rule.
///
/// Empty patterns place no constraint on their header; a rule with an empty
/// subject matches by sender only, and vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Substring the `From` header must contain.
    pub from_contains: String,
    /// Substring the `Subject` header must contain.
    pub subject_contains: String,
    /// Messages at or after this instant match.
    pub sent_after_or_at: DateTime<Utc>,
}

impl SearchQuery {
    /// Builds the query for `rule` with the window starting at `since`.
    #[must_use]
    pub fn for_rule(rule: &Rule, since: DateTime<Utc>) -> Self {
        Self {
            from_contains: rule.sender_pattern.clone(),
            subject_contains: rule.subject_pattern.clone(),
            sent_after_or_at: since,
        }
    }

    /// Returns the sender constraint, or `None` if any sender matches.
    #[must_use]
    pub fn sender(&self) -> Option<&str> {
        non_empty(&self.from_contains)
    }

    /// Returns the subject constraint, or `None` if any subject matches.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        non_empty(&self.subject_contains)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
