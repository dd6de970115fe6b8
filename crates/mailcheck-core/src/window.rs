//! Lookback window calculation.

use chrono::{DateTime, TimeDelta, Utc};

/// Returns the start of a rule's lookback window: `now - hour_threshold` hours.
///
/// A threshold of zero yields `now`. Thresholds reaching past the earliest
/// representable instant saturate to [`DateTime::<Utc>::MIN_UTC`].
#[must_use]
pub fn window_start(hour_threshold: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_signed(TimeDelta::hours(i64::from(hour_threshold)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
