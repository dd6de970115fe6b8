//! IMAP implementation of the Mailbox Service.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_imap::types::Fetch;
use async_imap::{Client, Session};
use futures::TryStreamExt;
use mailcheck_core::{
    MailboxConnector, MailboxError, MailboxSession, MatchSet, MatchedMessage, MessageId,
    SearchQuery,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::criteria::{quoted, search_criteria, sequence_set, within_window};
use crate::stream::{ImapStream, connect_tcp, upgrade_to_tls};
use crate::{ConnectError, ImapConfig, Security};

/// Items fetched for every search hit.
const FETCH_ITEMS: &str = "(UID ENVELOPE INTERNALDATE)";

/// Byte stream an IMAP session can run over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send> Transport for T {}

/// Opens IMAP sessions for one account.
#[derive(Debug, Clone)]
pub struct ImapConnector {
    config: ImapConfig,
}

impl ImapConnector {
    /// Creates a connector for the given server and credentials.
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self { config }
    }

    /// Returns the connection configuration.
    #[must_use]
    pub const fn config(&self) -> &ImapConfig {
        &self.config
    }

    async fn open(&self) -> Result<Client<ImapStream>, ConnectError> {
        let config = &self.config;
        let tcp = connect_tcp(&config.host, config.port).await?;

        let stream = match config.security {
            Security::Implicit => upgrade_to_tls(&config.host, tcp).await?,
            Security::None => ImapStream::Plain(tcp),
            Security::StartTls => {
                let mut client = Client::new(tcp);
                read_greeting(&mut client).await?;
                client.run_command_and_check_ok("STARTTLS", None).await?;
                let stream = upgrade_to_tls(&config.host, client.into_inner()).await?;
                // No second greeting after STARTTLS.
                return Ok(Client::new(stream));
            }
        };

        let mut client = Client::new(stream);
        read_greeting(&mut client).await?;
        Ok(client)
    }
}

async fn read_greeting<T: Transport>(client: &mut Client<T>) -> Result<(), ConnectError> {
    match client.read_response().await {
        Some(Ok(_)) => Ok(()),
        Some(Err(e)) => Err(e.into()),
        None => Err(ConnectError::NoGreeting),
    }
}

/// Logs in on a greeted connection and reads the server capabilities.
///
/// A session whose capabilities cannot be read is logged out before the
/// error is returned.
async fn authenticate<T: Transport>(
    client: Client<T>,
    config: &ImapConfig,
) -> Result<ImapSession<T>, MailboxError> {
    let timeout = config.timeout;

    let login = client.login(&config.username, &config.password);
    let mut session = match tokio::time::timeout(timeout, login).await {
        Ok(Ok(session)) => session,
        Ok(Err((e, _client))) => return Err(MailboxError::Authentication(e.to_string())),
        Err(_) => {
            return Err(MailboxError::Timeout {
                operation: "LOGIN",
                after: timeout,
            });
        }
    };

    let capabilities = match guarded(timeout, "CAPABILITY", session.capabilities()).await {
        Ok(capabilities) => capabilities,
        Err(e) => {
            if let Err(logout) = guarded(timeout, "LOGOUT", session.logout()).await {
                debug!(error = %logout, "Logout after failed CAPABILITY");
            }
            return Err(e);
        }
    };

    Ok(ImapSession {
        session,
        timeout,
        supports_move: capabilities.has_str("MOVE"),
        supports_uidplus: capabilities.has_str("UIDPLUS"),
    })
}

impl MailboxConnector for ImapConnector {
    type Session = ImapSession;

    async fn connect(&self) -> Result<ImapSession, MailboxError> {
        let config = &self.config;

        let client = match tokio::time::timeout(config.timeout, self.open()).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => return Err(MailboxError::Connection(e.to_string())),
            Err(_) => {
                return Err(MailboxError::Timeout {
                    operation: "CONNECT",
                    after: config.timeout,
                });
            }
        };

        let session = authenticate(client, config).await?;
        info!(
            host = %config.host,
            port = config.port,
            security = %config.security,
            user = %config.username,
            supports_move = session.supports_move,
            "Logged in"
        );

        Ok(session)
    }
}

/// An authenticated IMAP session.
pub struct ImapSession<T: Transport = ImapStream> {
    session: Session<T>,
    timeout: Duration,
    supports_move: bool,
    supports_uidplus: bool,
}

impl<T: Transport> fmt::Debug for ImapSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapSession")
            .field("timeout", &self.timeout)
            .field("supports_move", &self.supports_move)
            .field("supports_uidplus", &self.supports_uidplus)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ImapSession<T> {
    /// Moves messages without the MOVE extension: COPY, flag, expunge.
    async fn copy_and_expunge(&mut self, uid_set: &str, folder: &str) -> Result<(), MailboxError> {
        let timeout = self.timeout;
        let session = &mut self.session;

        guarded(timeout, "COPY", session.uid_copy(uid_set, quoted(folder))).await?;

        guarded(timeout, "STORE", async {
            session
                .uid_store(uid_set, "+FLAGS.SILENT (\\Deleted)")
                .await?
                .try_collect::<Vec<_>>()
                .await
        })
        .await?;

        if self.supports_uidplus {
            guarded(timeout, "EXPUNGE", async {
                session
                    .uid_expunge(uid_set)
                    .await?
                    .try_collect::<Vec<_>>()
                    .await
            })
            .await?;
        } else {
            guarded(timeout, "EXPUNGE", async {
                session.expunge().await?.try_collect::<Vec<_>>().await
            })
            .await?;
        }

        Ok(())
    }
}

impl<T: Transport> MailboxSession for ImapSession<T> {
    async fn ensure_folder_exists(&mut self, folder: &str) -> Result<(), MailboxError> {
        let created = tokio::time::timeout(self.timeout, self.session.create(folder)).await;

        match created {
            Ok(Ok(())) => {
                info!(folder, "Created folder");
                Ok(())
            }
            Ok(Err(async_imap::error::Error::No(ref reason))) if is_already_exists(reason) => {
                debug!(folder, "Folder already exists");
                Ok(())
            }
            Ok(Err(e)) => Err(MailboxError::FolderCreation {
                folder: folder.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(MailboxError::Timeout {
                operation: "CREATE",
                after: self.timeout,
            }),
        }
    }

    async fn select_mailbox(&mut self, mailbox: &str) -> Result<(), MailboxError> {
        let status = guarded(self.timeout, "SELECT", self.session.select(mailbox)).await?;
        debug!(mailbox, exists = status.exists, "Selected mailbox");
        Ok(())
    }

    async fn search(&mut self, query: &SearchQuery) -> Result<MatchSet, MailboxError> {
        let criteria = search_criteria(query);
        debug!(criteria = %criteria, "UID SEARCH");

        let mut uids: Vec<u32> =
            guarded(self.timeout, "SEARCH", self.session.uid_search(&criteria))
                .await?
                .into_iter()
                .collect();
        if uids.is_empty() {
            return Ok(MatchSet::new());
        }
        uids.sort_unstable();

        let ids: Vec<MessageId> = uids.into_iter().map(MessageId).collect();
        let uid_set = sequence_set(&ids);
        let session = &mut self.session;

        // The fetch stream is drained completely before any result is used.
        let fetches: Vec<Fetch> = guarded(self.timeout, "FETCH", async {
            session
                .uid_fetch(&uid_set, FETCH_ITEMS)
                .await?
                .try_collect::<Vec<Fetch>>()
                .await
        })
        .await?;

        let since = query.sent_after_or_at;
        let matches: MatchSet = fetches
            .iter()
            .filter(|fetch| within_window(fetch.internal_date(), since))
            .filter_map(|fetch| {
                let uid = fetch.uid?;
                let subject = fetch
                    .envelope()
                    .and_then(|envelope| envelope.subject.as_deref())
                    .map(|raw| String::from_utf8_lossy(raw).into_owned());
                Some(MatchedMessage::new(MessageId(uid), subject))
            })
            .collect();

        debug!(
            candidates = fetches.len(),
            matches = matches.len(),
            "Filtered search results to window"
        );
        Ok(matches)
    }

    async fn move_messages(
        &mut self,
        messages: &MatchSet,
        folder: &str,
    ) -> Result<(), MailboxError> {
        if messages.is_empty() {
            return Ok(());
        }

        let uid_set = sequence_set(&messages.ids());
        if self.supports_move {
            guarded(self.timeout, "MOVE", self.session.uid_mv(&uid_set, folder)).await
        } else {
            warn!(folder, "Server lacks MOVE, falling back to COPY and EXPUNGE");
            self.copy_and_expunge(&uid_set, folder).await
        }
    }

    async fn logout(mut self) -> Result<(), MailboxError> {
        guarded(self.timeout, "LOGOUT", self.session.logout()).await?;
        debug!("Logged out");
        Ok(())
    }
}

/// Runs an IMAP operation under the session timeout.
async fn guarded<T, F>(after: Duration, operation: &'static str, fut: F) -> Result<T, MailboxError>
where
    F: Future<Output = async_imap::error::Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(MailboxError::operation(operation, e)),
        Err(_) => Err(MailboxError::Timeout { operation, after }),
    }
}

/// Returns true if a CREATE rejection means the folder is already there.
fn is_already_exists(reason: &str) -> bool {
    // Covers the ALREADYEXISTS response code and free-text variants.
    reason.to_ascii_lowercase().contains("exists")
}
