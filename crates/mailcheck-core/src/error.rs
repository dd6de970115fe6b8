//! Error types for the core library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors reported by a Mailbox Service implementation.
///
/// Implementations must not report an already existing folder as a
/// [`MailboxError::FolderCreation`]; only genuine creation failures.
#[derive(Debug, Error)]
pub enum MailboxError {
    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Folder could not be created.
    #[error("Failed to create folder {folder}: {reason}")]
    FolderCreation {
        /// Folder that was being created.
        folder: String,
        /// Server or transport reason.
        reason: String,
    },

    /// Operation failed.
    #[error("{operation} failed: {reason}")]
    Operation {
        /// Protocol operation that failed (e.g. `SEARCH`).
        operation: &'static str,
        /// Server or transport reason.
        reason: String,
    },

    /// Operation did not complete in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Protocol operation that timed out.
        operation: &'static str,
        /// Configured timeout.
        after: Duration,
    },
}

impl MailboxError {
    /// Shorthand for an [`MailboxError::Operation`] error.
    pub fn operation(operation: &'static str, reason: impl ToString) -> Self {
        Self::Operation {
            operation,
            reason: reason.to_string(),
        }
    }
}

/// Fatal errors that abort a run.
///
/// Business failures (a rule finding or missing mail) are not errors; they are
/// recorded in the [`RunReport`](crate::RunReport).
#[derive(Debug, Error)]
pub enum Error {
    /// The mailbox session could not be opened.
    #[error("Could not open mailbox session: {0}")]
    Connect(#[source] MailboxError),

    /// An outcome folder could not be created.
    #[error("Could not prepare outcome folder {folder}: {source}")]
    Setup {
        /// Outcome folder name.
        folder: String,
        /// Underlying failure.
        #[source]
        source: MailboxError,
    },

    /// The monitored mailbox could not be selected.
    #[error("Could not select mailbox {mailbox}: {source}")]
    Select {
        /// Monitored mailbox name.
        mailbox: String,
        /// Underlying failure.
        #[source]
        source: MailboxError,
    },

    /// A rule's search could not be executed.
    #[error("Search failed for rule {rule}: {source}")]
    Search {
        /// Human-readable rule description.
        rule: String,
        /// Underlying failure.
        #[source]
        source: MailboxError,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading rules.
#[derive(Debug, Error)]
pub enum RuleSourceError {
    /// The rule file could not be read.
    #[error("Could not read rule file {}: {source}", path.display())]
    Io {
        /// Rule file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The rule file is not a valid rule list.
    #[error("Invalid rule file {}: {source}", path.display())]
    Parse {
        /// Rule file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
