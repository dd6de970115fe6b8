//! Mailbox Service abstraction.
//!
//! The run loop drives a [`MailboxConnector`] to open one [`MailboxSession`]
//! per run. Implementations translate these calls to a mail protocol; the
//! core never sees protocol details.

use std::future::Future;

use crate::{MailboxError, SearchQuery};

/// Identifier of a message within one mailbox session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u32);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedMessage {
    /// Session-scoped identifier.
    pub id: MessageId,
    /// Message subject, for logging.
    pub subject: Option<String>,
}

impl MatchedMessage {
    /// Creates a matched message.
    #[must_use]
    pub const fn new(id: MessageId, subject: Option<String>) -> Self {
        Self { id, subject }
    }
}

/// The complete, ordered result of one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    messages: Vec<MatchedMessage>,
}

impl MatchSet {
    /// Creates an empty match set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Number of matched messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterates the matched messages in search order.
    pub fn iter(&self) -> std::slice::Iter<'_, MatchedMessage> {
        self.messages.iter()
    }

    /// Identifiers of all matched messages.
    #[must_use]
    pub fn ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id).collect()
    }

    /// Appends a message.
    pub fn push(&mut self, message: MatchedMessage) {
        self.messages.push(message);
    }
}

impl From<Vec<MatchedMessage>> for MatchSet {
    fn from(messages: Vec<MatchedMessage>) -> Self {
        Self { messages }
    }
}

impl FromIterator<MatchedMessage> for MatchSet {
    fn from_iter<I: IntoIterator<Item = MatchedMessage>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a MatchedMessage;
    type IntoIter = std::slice::Iter<'a, MatchedMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Opens authenticated mailbox sessions.
///
/// Credentials and server endpoint belong to the implementation.
pub trait MailboxConnector: Send + Sync {
    /// Session type produced by [`MailboxConnector::connect`].
    type Session: MailboxSession;

    /// Connects and authenticates.
    fn connect(&self) -> impl Future<Output = Result<Self::Session, MailboxError>> + Send;
}

/// An open, authenticated mailbox session.
pub trait MailboxSession: Send {
    /// Creates `folder` unless it already exists.
    ///
    /// An existing folder is success, not an error.
    fn ensure_folder_exists(
        &mut self,
        folder: &str,
    ) -> impl Future<Output = Result<(), MailboxError>> + Send;

    /// Selects the monitored mailbox. Safe to repeat.
    fn select_mailbox(
        &mut self,
        mailbox: &str,
    ) -> impl Future<Output = Result<(), MailboxError>> + Send;

    /// Executes `query` against the selected mailbox.
    ///
    /// Returns only once every result has been retrieved.
    fn search(
        &mut self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<MatchSet, MailboxError>> + Send;

    /// Moves every message in `messages` to `folder`.
    ///
    /// An empty set is a no-op.
    fn move_messages(
        &mut self,
        messages: &MatchSet,
        folder: &str,
    ) -> impl Future<Output = Result<(), MailboxError>> + Send;

    /// Ends the session.
    fn logout(self) -> impl Future<Output = Result<(), MailboxError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: u32) -> MatchedMessage {
        MatchedMessage::new(MessageId(id), Some(format!("subject {id}")))
    }

    #[test]
    fn test_match_set_preserves_order() {
        let set: MatchSet = [message(7), message(3), message(9)].into_iter().collect();

        assert_eq!(set.len(), 3);
        assert_eq!(set.ids(), vec![MessageId(7), MessageId(3), MessageId(9)]);
    }

    #[test]
    fn test_empty_match_set() {
        let set = MatchSet::new();

        assert!(set.is_empty());
        assert!(set.ids().is_empty());
    }

    #[test]
    fn test_push_and_iterate() {
        let mut set = MatchSet::default();
        set.push(message(1));
        set.push(MatchedMessage::new(MessageId(2), None));

        let subjects: Vec<_> = set.iter().map(|m| m.subject.as_deref()).collect();
        assert_eq!(subjects, vec![Some("subject 1"), None]);
    }
}
