//! Password lookup in the system keyring.
//!
//! Used when no password is given on the command line or in the
//! environment. Entries live under the `mailcheck` service, keyed by the
//! login user name:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::debug;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "mailcheck";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Generates the keyring entry key for an IMAP login.
fn credential_key(username: &str) -> String {
    format!("{SERVICE_NAME}_imap_{username}")
}

/// Retrieves the IMAP password for `username` from the system keyring.
///
/// # Errors
///
/// Returns an error if the keyring cannot be accessed.
pub fn imap_password(username: &str) -> Result<Option<String>, CredentialError> {
    let entry = Entry::new(SERVICE_NAME, &credential_key(username))?;
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => {
            debug!(username, "No IMAP password in keyring");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Stores the IMAP password for `username` in the system keyring.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn store_imap_password(username: &str, password: &str) -> Result<(), CredentialError> {
    let entry = Entry::new(SERVICE_NAME, &credential_key(username))?;
    entry.set_password(password)?;
    debug!(username, "Stored IMAP password in keyring");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_key() {
        assert_eq!(
            credential_key("monitor@example.com"),
            "mailcheck_imap_monitor@example.com"
        );
    }
}
