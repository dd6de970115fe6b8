//! `mailcheck` - Cron-friendly mailbox monitor
//!
//! Evaluates declarative filter rules against an IMAP mailbox, routes
//! matched mail into an ok or failed folder, and reports through its exit
//! status whether any monitored condition failed.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod credentials;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mailcheck_core::{RunReport, SystemClock, load_rules, run};
use mailcheck_imap::ImapConnector;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Cli, Settings};

/// Every rule passed.
const EXIT_PASS: u8 = 0;
/// At least one rule signalled a failure.
const EXIT_FAILED: u8 = 1;
/// The mailbox could not be checked.
const EXIT_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Before logging, so RUST_LOG may come from the file too.
    let env_file = config::load_env_file();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailcheck=info,mailcheck_core=info,mailcheck_imap=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match env_file {
        Ok(Some(path)) => debug!(path = %path.display(), "Loaded environment file"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable environment file"),
    }

    let cli = Cli::parse();

    match check(&cli).await {
        Ok(None) => ExitCode::from(EXIT_PASS),
        Ok(Some(report)) => ExitCode::from(exit_status(&report)),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Runs a check. Returns `None` when only validating.
async fn check(cli: &Cli) -> anyhow::Result<Option<RunReport>> {
    let password = match &cli.password {
        Some(password) => Some(password.clone()),
        None => credentials::imap_password(cli.email.trim())
            .context("Failed to read password from keyring")?,
    };

    let settings = Settings::resolve(cli, password)?;

    if cli.save_password {
        credentials::store_imap_password(&settings.imap.username, &settings.imap.password)
            .context("Failed to store password in keyring")?;
        info!(username = %settings.imap.username, "Saved password to keyring");
    }

    let rules = load_rules(&settings.filters)?;
    info!(
        count = rules.len(),
        file = %settings.filters.display(),
        "Loaded filter rules"
    );

    if cli.validate {
        for (index, rule) in rules.iter().enumerate() {
            info!(index, %rule, "Rule");
        }
        info!(
            server = %settings.imap.host,
            port = settings.imap.port,
            security = %settings.imap.security,
            mailbox = %settings.run.mailbox,
            "Configuration is valid"
        );
        return Ok(None);
    }

    let connector = ImapConnector::new(settings.imap);
    let report = run(&connector, rules, &settings.run, &SystemClock).await?;

    summarize(&report);
    Ok(Some(report))
}

fn exit_status(report: &RunReport) -> u8 {
    if report.failed() {
        EXIT_FAILED
    } else {
        EXIT_PASS
    }
}

fn summarize(report: &RunReport) {
    for outcome in report.move_errors() {
        warn!(rule = %outcome.rule, "Matched messages were not moved");
    }

    let failures = report.failures().count();
    if failures == 0 {
        info!(rules = report.outcomes.len(), "All rules passed");
    } else {
        for outcome in report.failures() {
            error!(
                rule = %outcome.rule,
                matches = outcome.matches,
                decision = %outcome.decision,
                "Rule failed"
            );
        }
        error!(failures, rules = report.outcomes.len(), "Mail check failed");
    }
}
