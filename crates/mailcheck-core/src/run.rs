//! Run orchestration.
//!
//! A run opens one mailbox session, makes sure both outcome folders exist,
//! then evaluates rules strictly in order:
//!
//! ```text
//! select ─→ window ─→ query ─→ search ─→ classify ─→ (move) ─→ next rule
//! ```
//!
//! Connection, folder setup, select and search failures abort the run.
//! Move failures are logged and recorded; later rules still run. The session
//! is logged out on every exit path once it has been opened.

use tracing::{debug, error, info, warn};

use crate::classify::{Decision, Destination, classify};
use crate::clock::Clock;
use crate::service::{MailboxConnector, MailboxSession, MatchSet};
use crate::window::window_start;
use crate::{Error, Result, Rule, SearchQuery};

/// Mailbox and folder names for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Mailbox the rules are evaluated against.
    pub mailbox: String,
    /// Folder for expected messages.
    pub ok_folder: String,
    /// Folder for messages that signal a problem.
    pub failed_folder: String,
}

impl RunOptions {
    /// Creates run options.
    #[must_use]
    pub fn new(
        mailbox: impl Into<String>,
        ok_folder: impl Into<String>,
        failed_folder: impl Into<String>,
    ) -> Self {
        Self {
            mailbox: mailbox.into(),
            ok_folder: ok_folder.into(),
            failed_folder: failed_folder.into(),
        }
    }

    /// Returns the folder name for a destination.
    #[must_use]
    pub fn folder(&self, destination: Destination) -> &str {
        match destination {
            Destination::Ok => &self.ok_folder,
            Destination::Failed => &self.failed_folder,
        }
    }
}

/// What happened to a rule's matched messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveStatus {
    /// The decision did not call for a move.
    NotAttempted,
    /// All matched messages were moved.
    Moved {
        /// Destination folder.
        folder: String,
        /// Number of messages moved.
        count: usize,
    },
    /// The move was attempted and failed.
    Failed {
        /// Destination folder.
        folder: String,
        /// Failure description.
        reason: String,
    },
}

/// The evaluated result of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Position of the rule in the rule source.
    pub index: usize,
    /// The evaluated rule.
    pub rule: Rule,
    /// Number of matched messages.
    pub matches: usize,
    /// Classification of the match count.
    pub decision: Decision,
    /// Result of acting on the decision.
    pub moved: MoveStatus,
}

/// Result of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Per-rule outcomes, in evaluation order.
    pub outcomes: Vec<RuleOutcome>,
}

impl RunReport {
    /// Returns true if any rule signalled a monitored failure.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.outcomes.iter().any(|o| o.decision.is_failure())
    }

    /// Outcomes whose decision is a failure.
    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| o.decision.is_failure())
    }

    /// Outcomes whose move was attempted and failed.
    pub fn move_errors(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.moved, MoveStatus::Failed { .. }))
    }
}

/// Evaluates `rules` against the mailbox reached through `connector`.
///
/// Rules are pulled from the iterator one at a time and evaluated in order.
///
/// # Errors
///
/// Returns an error if the session cannot be opened, an outcome folder cannot
/// be created, or the mailbox cannot be selected or searched. Rules that find
/// (or miss) mail are reported through [`RunReport::failed`], not as errors.
pub async fn run<C, R>(
    connector: &C,
    rules: R,
    options: &RunOptions,
    clock: &dyn Clock,
) -> Result<RunReport>
where
    C: MailboxConnector,
    R: IntoIterator<Item = Rule>,
{
    let mut session = connector.connect().await.map_err(Error::Connect)?;
    debug!(mailbox = %options.mailbox, "Mailbox session opened");

    let result = evaluate(&mut session, rules, options, clock).await;

    if let Err(e) = session.logout().await {
        warn!(error = %e, "Failed to close mailbox session");
    }

    result
}

async fn evaluate<S, R>(
    session: &mut S,
    rules: R,
    options: &RunOptions,
    clock: &dyn Clock,
) -> Result<RunReport>
where
    S: MailboxSession,
    R: IntoIterator<Item = Rule>,
{
    for folder in [&options.ok_folder, &options.failed_folder] {
        session
            .ensure_folder_exists(folder)
            .await
            .map_err(|source| Error::Setup {
                folder: folder.clone(),
                source,
            })?;
    }

    let mut report = RunReport::default();
    for (index, rule) in rules.into_iter().enumerate() {
        let outcome = evaluate_rule(session, index, rule, options, clock).await?;
        report.outcomes.push(outcome);
    }

    info!(
        rules = report.outcomes.len(),
        failures = report.failures().count(),
        move_errors = report.move_errors().count(),
        failed = report.failed(),
        "Run complete"
    );

    Ok(report)
}

async fn evaluate_rule<S: MailboxSession>(
    session: &mut S,
    index: usize,
    rule: Rule,
    options: &RunOptions,
    clock: &dyn Clock,
) -> Result<RuleOutcome> {
    session
        .select_mailbox(&options.mailbox)
        .await
        .map_err(|source| Error::Select {
            mailbox: options.mailbox.clone(),
            source,
        })?;

    let since = window_start(rule.hour_threshold, clock.now());
    let query = SearchQuery::for_rule(&rule, since);
    debug!(index, rule = %rule, since = %since, "Searching");

    let matches = session
        .search(&query)
        .await
        .map_err(|source| Error::Search {
            rule: rule.to_string(),
            source,
        })?;

    let decision = classify(&rule, matches.len());
    let moved = match decision.destination() {
        Some(destination) => route(session, &matches, options.folder(destination)).await,
        None => MoveStatus::NotAttempted,
    };

    let outcome = RuleOutcome {
        index,
        rule,
        matches: matches.len(),
        decision,
        moved,
    };
    log_outcome(&outcome);

    Ok(outcome)
}

async fn route<S: MailboxSession>(
    session: &mut S,
    matches: &MatchSet,
    folder: &str,
) -> MoveStatus {
    for message in matches {
        debug!(
            id = %message.id,
            subject = message.subject.as_deref().unwrap_or(""),
            folder,
            "Moving message"
        );
    }

    match session.move_messages(matches, folder).await {
        Ok(()) => MoveStatus::Moved {
            folder: folder.to_string(),
            count: matches.len(),
        },
        Err(e) => MoveStatus::Failed {
            folder: folder.to_string(),
            reason: e.to_string(),
        },
    }
}

fn log_outcome(outcome: &RuleOutcome) {
    let rule = &outcome.rule;
    let sender = rule.sender_pattern.as_str();
    let subject = rule.subject_pattern.as_str();
    let comment = rule.comment.as_str();
    let matches = outcome.matches;

    match (outcome.decision, &outcome.moved) {
        (Decision::NoAction, _) => {
            info!(sender, subject, comment, "No matching messages");
        }
        (Decision::ReportNotFoundFailure, _) => {
            error!(
                sender,
                subject,
                comment,
                hours = rule.hour_threshold,
                "Expected messages not found"
            );
        }
        (decision, MoveStatus::Moved { folder, count }) => {
            if decision.is_failure() {
                error!(
                    sender,
                    subject,
                    comment,
                    matches,
                    folder = %folder,
                    "Unwanted messages found"
                );
            } else {
                info!(sender, subject, comment, count, folder = %folder, "Moved messages");
            }
        }
        (decision, MoveStatus::Failed { folder, reason }) => {
            if decision.is_failure() {
                error!(sender, subject, comment, matches, "Unwanted messages found");
            }
            warn!(
                sender,
                subject,
                comment,
                matches,
                folder = %folder,
                reason = %reason,
                "Failed to move messages"
            );
        }
        (decision, MoveStatus::NotAttempted) => {
            debug!(sender, subject, comment, decision = %decision, "No move performed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageId;

    #[test]
    fn test_options_folder() {
        let options = RunOptions::new("INBOX", "OK", "Failed");

        assert_eq!(options.folder(Destination::Ok), "OK");
        assert_eq!(options.folder(Destination::Failed), "Failed");
    }

    fn outcome(decision: Decision, moved: MoveStatus) -> RuleOutcome {
        RuleOutcome {
            index: 0,
            rule: Rule::new("a@x.com", "b"),
            matches: 1,
            decision,
            moved,
        }
    }

    #[test]
    fn test_report_failed_only_on_failure_decisions() {
        let mut report = RunReport::default();
        assert!(!report.failed());

        report
            .outcomes
            .push(outcome(Decision::NoAction, MoveStatus::NotAttempted));
        report.outcomes.push(outcome(
            Decision::RouteToOk,
            MoveStatus::Failed {
                folder: "OK".into(),
                reason: "MOVE failed".into(),
            },
        ));
        assert!(!report.failed());
        assert_eq!(report.move_errors().count(), 1);

        report.outcomes.push(outcome(
            Decision::ReportNotFoundFailure,
            MoveStatus::NotAttempted,
        ));
        assert!(report.failed());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_message_id_display() {
        assert_eq!(MessageId(42).to_string(), "42");
    }
}
