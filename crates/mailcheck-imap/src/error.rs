//! Connection setup errors.

use thiserror::Error;

/// Errors that can occur while establishing the transport.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// IMAP protocol error before authentication.
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),

    /// Server closed the connection before sending a greeting.
    #[error("Server closed the connection without a greeting")]
    NoGreeting,
}
