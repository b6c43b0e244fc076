// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for timestamps stored on profile documents and carried on
//! device location fixes.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Milliseconds since the Unix epoch (the unit device location fixes use).
pub fn unix_millis(date: DateTime<Utc>) -> i64 {
    date.timestamp_millis()
}

/// Whether a millisecond timestamp is more than `max_age_ms` before `now_ms`.
///
/// Timestamps from the future count as fresh.
pub fn is_older_than(timestamp_ms: i64, now_ms: i64, max_age_ms: u64) -> bool {
    now_ms.saturating_sub(timestamp_ms) > max_age_ms as i64
}
