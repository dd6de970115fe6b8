//! # mailcheck-core
//!
//! Rule evaluation and message routing engine for mailbox monitoring.
//!
//! A run evaluates an ordered list of [`Rule`]s against one mailbox. Each
//! rule is turned into a bounded [`SearchQuery`], the matches are classified
//! into a [`Decision`], and matched messages are moved to an "ok" or "failed"
//! folder. The run ends with a [`RunReport`] whose [`RunReport::failed`] flag
//! summarizes whether any rule signalled a monitored problem.
//!
//! This crate provides:
//! - **Rules** - the filter data model and the JSON rule file loader
//! - **Window calculation** - relative lookback hours to an absolute boundary
//! - **Query building** - protocol-agnostic search queries
//! - **Classification** - match count plus expectation flags to a routing decision
//! - **Orchestration** - the sequential run loop over a [`MailboxConnector`]
//!
//! The mail protocol itself lives behind the [`MailboxConnector`] and
//! [`MailboxSession`] traits; see the `mailcheck-imap` crate for the IMAP
//! implementation.
//!
//! ## Example
//!
//! ```ignore
//! use mailcheck_core::{RunOptions, SystemClock, load_rules, run};
//!
//! let rules = load_rules("filters.json".as_ref())?;
//! let options = RunOptions::new("INBOX", "Monitoring/OK", "Monitoring/Failed");
//! let report = run(&connector, rules, &options, &SystemClock).await?;
//!
//! if report.failed() {
//!     std::process::exit(1);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod clock;
mod error;
pub mod query;
pub mod rule;
pub mod run;
pub mod service;
pub mod window;

pub use classify::{Decision, Destination, classify};
pub use clock::{Clock, MockClock, SystemClock};
pub use error::{Error, MailboxError, Result, RuleSourceError};
pub use query::SearchQuery;
pub use rule::{Rule, load_rules, parse_rules};
pub use run::{MoveStatus, RuleOutcome, RunOptions, RunReport, run};
pub use service::{MailboxConnector, MailboxSession, MatchSet, MatchedMessage, MessageId};
pub use window::window_start;
