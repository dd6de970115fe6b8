//! Command line and environment configuration.
//!
//! Every option can be given as a flag or through the environment variable
//! shown in `--help`. A `.env` file in the working directory is loaded into
//! the environment first; variables already set take precedence. Values are
//! resolved once into [`Settings`] before the run starts.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use mailcheck_core::RunOptions;
use mailcheck_imap::{ImapConfig, Security};

/// Evaluate mail filter rules against a mailbox and route matches.
#[derive(Debug, Clone, Parser)]
#[command(name = "mailcheck", version, about)]
pub struct Cli {
    /// IMAP server as `host` or `host:port`.
    #[arg(long, env = "SERVER")]
    pub server: String,

    /// Login user name.
    #[arg(long, env = "EMAIL")]
    pub email: String,

    /// Login password. Looked up in the system keyring when omitted.
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Folder that receives expected messages.
    #[arg(long, env = "MAIL_OK_FOLDER")]
    pub ok_folder: String,

    /// Folder that receives messages signalling a problem.
    #[arg(long, env = "MAIL_FAILED_FOLDER")]
    pub failed_folder: String,

    /// Mailbox the rules are evaluated against.
    #[arg(long, env = "MAILBOX", default_value = "INBOX")]
    pub mailbox: String,

    /// Rule file (JSON array of filter rules).
    #[arg(long, env = "FILTERS_FILE", default_value = "filters.json")]
    pub filters: PathBuf,

    /// Connection security: tls, starttls or none.
    #[arg(long, env = "IMAP_SECURITY", default_value = "tls")]
    pub security: Security,

    /// Timeout for each IMAP operation, in seconds.
    #[arg(long, env = "IMAP_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Store the given password in the system keyring for later runs.
    #[arg(long, requires = "password")]
    pub save_password: bool,

    /// Check configuration and rules without connecting.
    #[arg(long)]
    pub validate: bool,
}

/// A configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Server host is empty.
    EmptyHost,
    /// Server port is not a number in 1-65535.
    InvalidPort(String),
    /// Login user name is empty.
    EmptyUsername,
    /// No password was given and none is stored.
    MissingPassword,
    /// Ok folder name is empty.
    EmptyOkFolder,
    /// Failed folder name is empty.
    EmptyFailedFolder,
    /// Monitored mailbox name is empty.
    EmptyMailbox,
    /// Ok and failed folders are the same.
    SameOutcomeFolders,
    /// An outcome folder is the monitored mailbox.
    OutcomeFolderIsMailbox(String),
    /// Timeout is zero.
    ZeroTimeout,
}

impl ConfigError {
    /// Get the option this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyHost | Self::InvalidPort(_) => "server",
            Self::EmptyUsername => "email",
            Self::MissingPassword => "password",
            Self::EmptyOkFolder | Self::SameOutcomeFolders => "ok-folder",
            Self::EmptyFailedFolder => "failed-folder",
            Self::EmptyMailbox | Self::OutcomeFolderIsMailbox(_) => "mailbox",
            Self::ZeroTimeout => "timeout-secs",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyHost => write!(f, "IMAP server is required"),
            Self::InvalidPort(port) => write!(f, "IMAP port must be 1-65535, got {port:?}"),
            Self::EmptyUsername => write!(f, "Login user name is required"),
            Self::MissingPassword => {
                write!(f, "Password is required (flag, PASSWORD or system keyring)")
            }
            Self::EmptyOkFolder => write!(f, "Ok folder name is required"),
            Self::EmptyFailedFolder => write!(f, "Failed folder name is required"),
            Self::EmptyMailbox => write!(f, "Mailbox name is required"),
            Self::SameOutcomeFolders => write!(f, "Ok and failed folders must differ"),
            Self::OutcomeFolderIsMailbox(folder) => {
                write!(f, "Outcome folder {folder:?} is the monitored mailbox")
            }
            Self::ZeroTimeout => write!(f, "Timeout must be at least one second"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// All problems found in a configuration.
#[derive(Debug, thiserror::Error)]
#[error("Invalid configuration: {}", join(.0))]
pub struct InvalidConfig(pub Vec<ConfigError>);

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {e}", e.field()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// IMAP connection parameters.
    pub imap: ImapConfig,
    /// Mailbox and outcome folders.
    pub run: RunOptions,
    /// Rule file path.
    pub filters: PathBuf,
}

impl Settings {
    /// Resolves and validates settings.
    ///
    /// `password` is the already looked-up password (flag, environment or
    /// keyring).
    ///
    /// # Errors
    ///
    /// Returns every configuration problem found.
    pub fn resolve(cli: &Cli, password: Option<String>) -> Result<Self, InvalidConfig> {
        let mut errors = Vec::new();

        let (host, port) = match parse_server(&cli.server, cli.security) {
            Ok((host, port)) => {
                if host.is_empty() {
                    errors.push(ConfigError::EmptyHost);
                }
                (host, port)
            }
            Err(e) => {
                errors.push(e);
                (String::new(), cli.security.default_port())
            }
        };

        if cli.email.trim().is_empty() {
            errors.push(ConfigError::EmptyUsername);
        }
        let password = password.filter(|p| !p.is_empty());
        if password.is_none() {
            errors.push(ConfigError::MissingPassword);
        }

        let mailbox = cli.mailbox.trim();
        let ok_folder = cli.ok_folder.trim();
        let failed_folder = cli.failed_folder.trim();
        if mailbox.is_empty() {
            errors.push(ConfigError::EmptyMailbox);
        }
        if ok_folder.is_empty() {
            errors.push(ConfigError::EmptyOkFolder);
        }
        if failed_folder.is_empty() {
            errors.push(ConfigError::EmptyFailedFolder);
        }
        if !ok_folder.is_empty() && ok_folder == failed_folder {
            errors.push(ConfigError::SameOutcomeFolders);
        }
        for folder in [ok_folder, failed_folder] {
            if !folder.is_empty() && same_mailbox(folder, mailbox) {
                errors.push(ConfigError::OutcomeFolderIsMailbox(folder.to_string()));
            }
        }
        if cli.timeout_secs == 0 {
            errors.push(ConfigError::ZeroTimeout);
        }

        if !errors.is_empty() {
            return Err(InvalidConfig(errors));
        }

        let imap = ImapConfig::new(host, cli.email.trim(), password.unwrap_or_default())
            .security(cli.security)
            .port(port)
            .timeout(Duration::from_secs(cli.timeout_secs));

        Ok(Self {
            imap,
            run: RunOptions::new(mailbox, ok_folder, failed_folder),
            filters: cli.filters.clone(),
        })
    }
}

/// Returns true if two mailbox names refer to the same mailbox.
///
/// Only `INBOX` is case-insensitive; every other name is compared exactly.
fn same_mailbox(a: &str, b: &str) -> bool {
    if a.eq_ignore_ascii_case("INBOX") || b.eq_ignore_ascii_case("INBOX") {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// Loads `.env` from the working directory into the process environment.
///
/// Returns the loaded file, or `None` when there is no such file.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_env_file() -> Result<Option<PathBuf>, dotenvy::Error> {
    ignore_missing(dotenvy::dotenv())
}

fn ignore_missing(result: dotenvy::Result<PathBuf>) -> Result<Option<PathBuf>, dotenvy::Error> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Splits `host[:port]`, defaulting the port from the security mode.
///
/// IPv6 literals must be bracketed when a port is given (`[::1]:993`).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPort`] if the port is not a valid number.
pub fn parse_server(server: &str, security: Security) -> Result<(String, u16), ConfigError> {
    let server = server.trim();

    let (host, port) = if let Some(rest) = server.strip_prefix('[') {
        match rest.split_once(']') {
            Some((host, "")) => (host, None),
            Some((host, tail)) => (host, Some(tail.strip_prefix(':').unwrap_or(tail))),
            None => (server, None),
        }
    } else {
        match server.split_once(':') {
            Some((host, port)) if !port.contains(':') => (host, Some(port)),
            _ => (server, None),
        }
    };

    let port = match port {
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => return Err(ConfigError::InvalidPort(raw.to_string())),
        },
        None => security.default_port(),
    };

    Ok((host.to_string(), port))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Parses a complete command line, replacing base values with `args`.
    fn cli(args: &[&str]) -> Cli {
        let mut options = vec![
            ("--server", "imap.example.com:993"),
            ("--email", "monitor@example.com"),
            ("--ok-folder", "Monitoring/OK"),
            ("--failed-folder", "Monitoring/Failed"),
            ("--mailbox", "INBOX"),
            ("--filters", "filters.json"),
            ("--security", "tls"),
            ("--timeout-secs", "60"),
        ];
        let mut flags = Vec::new();

        let mut iter = args.iter().peekable();
        while let Some(&arg) = iter.next() {
            let value = iter.next_if(|next| !next.starts_with("--"));
            let position = options.iter().position(|(name, _)| *name == arg);
            match (position, value) {
                (Some(i), Some(&value)) => options[i].1 = value,
                (None, Some(&value)) => options.push((arg, value)),
                (_, None) => flags.push(arg),
            }
        }

        let mut argv = vec!["mailcheck"];
        for (name, value) in options {
            argv.push(name);
            argv.push(value);
        }
        argv.extend(flags);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_server() {
        assert_eq!(
            parse_server("imap.example.com:1993", Security::Implicit).unwrap(),
            ("imap.example.com".to_string(), 1993)
        );
        assert_eq!(
            parse_server("imap.example.com", Security::Implicit).unwrap(),
            ("imap.example.com".to_string(), 993)
        );
        assert_eq!(
            parse_server("imap.example.com", Security::StartTls).unwrap(),
            ("imap.example.com".to_string(), 143)
        );
        assert_eq!(
            parse_server("[::1]:1143", Security::None).unwrap(),
            ("::1".to_string(), 1143)
        );
        assert_eq!(
            parse_server("::1", Security::None).unwrap(),
            ("::1".to_string(), 143)
        );
    }

    #[test]
    fn test_parse_server_bad_port() {
        assert_eq!(
            parse_server("imap.example.com:imaps", Security::Implicit),
            Err(ConfigError::InvalidPort("imaps".into()))
        );
        assert_eq!(
            parse_server("imap.example.com:0", Security::Implicit),
            Err(ConfigError::InvalidPort("0".into()))
        );
    }

    #[test]
    fn test_resolve_valid() {
        let settings = Settings::resolve(&cli(&[]), Some("secret".into())).unwrap();

        assert_eq!(settings.imap.host, "imap.example.com");
        assert_eq!(settings.imap.port, 993);
        assert_eq!(settings.imap.username, "monitor@example.com");
        assert_eq!(settings.imap.password, "secret");
        assert_eq!(settings.imap.timeout, Duration::from_secs(60));
        assert_eq!(
            settings.run,
            RunOptions::new("INBOX", "Monitoring/OK", "Monitoring/Failed")
        );
        assert_eq!(settings.filters, PathBuf::from("filters.json"));
    }

    #[test]
    fn test_resolve_missing_password() {
        let err = Settings::resolve(&cli(&[]), None).unwrap_err();
        assert_eq!(err.0, vec![ConfigError::MissingPassword]);

        let err = Settings::resolve(&cli(&[]), Some(String::new())).unwrap_err();
        assert_eq!(err.0, vec![ConfigError::MissingPassword]);
    }

    #[test]
    fn test_resolve_collects_all_errors() {
        let cli = cli(&[
            "--server",
            "",
            "--ok-folder",
            "Same",
            "--failed-folder",
            "Same",
            "--timeout-secs",
            "0",
        ]);
        let err = Settings::resolve(&cli, Some("pw".into())).unwrap_err();

        assert_eq!(
            err.0,
            vec![
                ConfigError::EmptyHost,
                ConfigError::SameOutcomeFolders,
                ConfigError::ZeroTimeout
            ]
        );
        let message = err.to_string();
        assert!(message.contains("server: IMAP server is required"));
        assert!(message.contains("timeout-secs"));
    }

    #[test]
    fn test_outcome_folder_cannot_be_mailbox() {
        let cli = cli(&["--ok-folder", "inbox"]);
        let err = Settings::resolve(&cli, Some("pw".into())).unwrap_err();

        assert_eq!(
            err.0,
            vec![ConfigError::OutcomeFolderIsMailbox("inbox".into())]
        );
    }

    #[test]
    fn test_only_inbox_is_case_insensitive() {
        let distinct = cli(&["--mailbox", "Archive", "--ok-folder", "archive"]);
        assert!(Settings::resolve(&distinct, Some("pw".into())).is_ok());

        let same = cli(&["--mailbox", "Archive", "--failed-folder", "Archive"]);
        let err = Settings::resolve(&same, Some("pw".into())).unwrap_err();
        assert_eq!(
            err.0,
            vec![ConfigError::OutcomeFolderIsMailbox("Archive".into())]
        );
    }

    #[test]
    fn test_same_mailbox() {
        assert!(same_mailbox("INBOX", "inbox"));
        assert!(same_mailbox("Inbox", "INBOX"));
        assert!(!same_mailbox("Archive", "archive"));
        assert!(same_mailbox("Archive", "Archive"));
        assert!(!same_mailbox("INBOX", "INBOX/Sub"));
    }

    #[test]
    fn test_security_flag_sets_default_port() {
        let cli = cli(&["--server", "mail.local", "--security", "starttls"]);
        let settings = Settings::resolve(&cli, Some("pw".into())).unwrap();

        assert_eq!(settings.imap.security, Security::StartTls);
        assert_eq!(settings.imap.port, 143);
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        let result = dotenvy::from_path(&path).map(|()| path.clone());
        assert!(matches!(ignore_missing(result), Ok(None)));
    }

    #[test]
    fn test_malformed_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "MAILCHECK_TEST_ENTRY='unterminated\n").unwrap();

        let result = dotenvy::from_path(&path).map(|()| path.clone());
        assert!(ignore_missing(result).is_err());
    }

    #[test]
    fn test_env_file_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "SERVER=imap.example.com:993\nMAIL_OK_FOLDER=\"Monitoring/OK\"\n",
        )
        .unwrap();

        let entries: Vec<(String, String)> = dotenvy::from_path_iter(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            entries,
            vec![
                ("SERVER".to_string(), "imap.example.com:993".to_string()),
                ("MAIL_OK_FOLDER".to_string(), "Monitoring/OK".to_string()),
            ]
        );
    }

    #[test]
    fn test_save_password_flag() {
        let cli = cli(&["--password", "pw", "--save-password", "--validate"]);

        assert!(cli.save_password);
        assert!(cli.validate);
        assert_eq!(cli.password.as_deref(), Some("pw"));
    }
}
