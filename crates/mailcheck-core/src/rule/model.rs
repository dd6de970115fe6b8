//! Rule data model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A configured check evaluated against the monitored mailbox.
///
/// Field names on the wire follow the rule file format
/// (`mail`, `subject`, `fail_if_found`, `fail_if_not_found`,
/// `hour_threshold`, `comment`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// Substring matched against the `From` header. Empty matches any sender.
    #[serde(rename = "mail")]
    pub sender_pattern: String,
    /// Substring matched against the `Subject` header. Empty matches any subject.
    #[serde(rename = "subject")]
    pub subject_pattern: String,
    /// Any match is a failure.
    pub fail_if_found: bool,
    /// Zero matches is a failure.
    pub fail_if_not_found: bool,
    /// Lookback window in hours, relative to evaluation time.
    pub hour_threshold: u32,
    /// Free text for diagnostics.
    pub comment: String,
}

impl Rule {
    /// Creates a rule matching the given sender and subject patterns.
    #[must_use]
    pub fn new(sender_pattern: impl Into<String>, subject_pattern: impl Into<String>) -> Self {
        Self {
            sender_pattern: sender_pattern.into(),
            subject_pattern: subject_pattern.into(),
            ..Self::default()
        }
    }

    /// Sets the lookback window in hours.
    #[must_use]
    pub fn within_hours(mut self, hours: u32) -> Self {
        self.hour_threshold = hours;
        self
    }

    /// Marks any match as a failure.
    #[must_use]
    pub fn fail_if_found(mut self) -> Self {
        self.fail_if_found = true;
        self
    }

    /// Marks an empty result as a failure.
    #[must_use]
    pub fn fail_if_not_found(mut self) -> Self {
        self.fail_if_not_found = true;
        self
    }

    /// Attaches a diagnostic comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Returns true if neither the sender nor the subject is constrained.
    #[must_use]
    pub fn matches_everything(&self) -> bool {
        self.sender_pattern.is_empty() && self.subject_pattern.is_empty()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "from={:?} subject={:?} within {}h",
            self.sender_pattern, self.subject_pattern, self.hour_threshold
        )?;
        if !self.comment.is_empty() {
            write!(f, " ({})", self.comment)?;
        }
        Ok(())
    }
}
