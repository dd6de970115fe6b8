//! Outcome classification.
//!
//! | matches | `fail_if_not_found` | `fail_if_found` | decision                  |
//! |---------|---------------------|-----------------|---------------------------|
//! | 0       | true                | any             | `ReportNotFoundFailure`   |
//! | 0       | false               | any             | `NoAction`                |
//! | > 0     | any                 | true            | `RouteToFailed`           |
//! | > 0     | any                 | false           | `RouteToOk`               |
//!
//! `fail_if_not_found` is only consulted when nothing matched, so presence
//! wins when both flags are set and messages exist.

use std::fmt;

use crate::Rule;

/// Routing decision for one rule's search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing matched and nothing was expected.
    NoAction,
    /// Nothing matched but the rule expected mail.
    ReportNotFoundFailure,
    /// Matched messages are expected; move them to the ok folder.
    RouteToOk,
    /// Matched messages signal a problem; move them to the failed folder.
    RouteToFailed,
}

/// Outcome folder a decision routes messages to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The "ok" folder.
    Ok,
    /// The "failed" folder.
    Failed,
}

impl Decision {
    /// Returns true if this decision marks the run as failed.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::ReportNotFoundFailure | Self::RouteToFailed)
    }

    /// Returns the folder matched messages go to, if any.
    #[must_use]
    pub const fn destination(self) -> Option<Destination> {
        match self {
            Self::NoAction | Self::ReportNotFoundFailure => None,
            Self::RouteToOk => Some(Destination::Ok),
            Self::RouteToFailed => Some(Destination::Failed),
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAction => "no_action",
            Self::ReportNotFoundFailure => "not_found",
            Self::RouteToOk => "route_ok",
            Self::RouteToFailed => "route_failed",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a rule's search result by its match count.
#[must_use]
pub const fn classify(rule: &Rule, matches: usize) -> Decision {
    if matches == 0 {
        if rule.fail_if_not_found {
            Decision::ReportNotFoundFailure
        } else {
            Decision::NoAction
        }
    } else if rule.fail_if_found {
        Decision::RouteToFailed
    } else {
        Decision::RouteToOk
    }
}
