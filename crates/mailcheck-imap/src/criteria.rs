//! Translation of search queries into IMAP SEARCH criteria.
//!
//! IMAP `SINCE` only has day granularity and is evaluated in the server's
//! timezone, so the rendered criteria reach one day further back than the
//! query and [`within_window`] trims the fetched messages to the exact
//! boundary.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use mailcheck_core::{MessageId, SearchQuery};

/// Pattern treated as "any value" for a header; IMAP SEARCH has no wildcards.
pub const WILDCARD: &str = "*";

/// Earliest date rendered in `SINCE`. Servers reject years before 1 and
/// nothing older than the epoch was delivered over IMAP.
pub const DATE_FLOOR: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Renders `query` as IMAP SEARCH criteria.
///
/// Empty and wildcard patterns contribute no criterion. A `CHARSET UTF-8`
/// prefix is added when a pattern is not plain ASCII.
#[must_use]
pub fn search_criteria(query: &SearchQuery) -> String {
    let mut buf = String::new();

    let sender = query.sender().filter(|s| *s != WILDCARD);
    let subject = query.subject().filter(|s| *s != WILDCARD);

    if sender.into_iter().chain(subject).any(|s| !s.is_ascii()) {
        buf.push_str("CHARSET UTF-8 ");
    }
    if let Some(sender) = sender {
        buf.push_str("FROM ");
        write_quoted(&mut buf, sender);
        buf.push(' ');
    }
    if let Some(subject) = subject {
        buf.push_str("SUBJECT ");
        write_quoted(&mut buf, subject);
        buf.push(' ');
    }

    buf.push_str("SINCE ");
    buf.push_str(&imap_date(since_date(query.sent_after_or_at)));
    buf
}

/// Day used for `SINCE`: one day before `since`, never before [`DATE_FLOOR`].
fn since_date(since: DateTime<Utc>) -> DateTime<Utc> {
    since
        .checked_sub_signed(TimeDelta::days(1))
        .filter(|date| *date > DATE_FLOOR)
        .unwrap_or(DATE_FLOOR)
}

/// Formats the calendar date of `at` as an IMAP date (`14-Oct-2026`).
#[must_use]
pub fn imap_date(at: DateTime<Utc>) -> String {
    at.format("%d-%b-%Y").to_string()
}

/// Returns true if a message received at `internal_date` falls in the window.
///
/// Messages without an internal date cannot be placed and are kept.
#[must_use]
pub fn within_window(internal_date: Option<DateTime<FixedOffset>>, since: DateTime<Utc>) -> bool {
    internal_date.is_none_or(|date| date.with_timezone(&Utc) >= since)
}

/// Renders message identifiers as a compact IMAP sequence set (`1:3,7`).
#[must_use]
pub fn sequence_set(ids: &[MessageId]) -> String {
    let mut sorted: Vec<u32> = ids.iter().map(|id| id.0).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for id in sorted {
        match ranges.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(id) => *end = id,
            _ => ranges.push((id, id)),
        }
    }

    ranges
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}:{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Returns `s` as an IMAP quoted string.
#[must_use]
pub fn quoted(s: &str) -> String {
    let mut buf = String::with_capacity(s.len() + 2);
    write_quoted(&mut buf, s);
    buf
}

/// Writes `s` as an IMAP quoted string.
fn write_quoted(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            buf.push('\\');
        }
        buf.push(c);
    }
    buf.push('"');
}
