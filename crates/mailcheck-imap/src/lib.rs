//! # mailcheck-imap
//!
//! IMAP implementation of the `mailcheck-core` Mailbox Service.
//!
//! The protocol is handled by [`async_imap`]; this crate adds connection
//! setup (implicit TLS, STARTTLS or plaintext via `tokio-rustls`), the
//! translation of a [`SearchQuery`](mailcheck_core::SearchQuery) into IMAP
//! SEARCH criteria, exact window filtering on the messages' internal date,
//! and batch moves with a COPY/EXPUNGE fallback for servers without MOVE.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailcheck_core::{RunOptions, SystemClock, run};
//! use mailcheck_imap::{ImapConfig, ImapConnector};
//!
//! let config = ImapConfig::new("imap.example.com", "monitor@example.com", "secret");
//! let connector = ImapConnector::new(config);
//! let options = RunOptions::new("INBOX", "Monitoring/OK", "Monitoring/Failed");
//!
//! let report = run(&connector, rules, &options, &SystemClock).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
pub mod criteria;
mod error;
mod session;
pub mod stream;

pub use config::{ImapConfig, Security};
pub use error::ConnectError;
pub use session::{ImapConnector, ImapSession, Transport};
pub use stream::ImapStream;
