// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert a chrono timestamp to the `time` type used by cookie attributes.
///
/// Sub-second precision is dropped; cookie `Expires` is second-granular.
pub fn to_offset_date_time(date: DateTime<Utc>) -> time::OffsetDateTime {
    time::OffsetDateTime::from_unix_timestamp(date.timestamp())
        .unwrap_or(time::OffsetDateTime::UNIX_EPOCH)
}
