// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar windows.

use chrono::{DateTime, Datelike, Duration, NaiveTime, SecondsFormat, Utc};
use serde::Serialize;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
///
/// Fixed second precision keeps lexical order equal to chronological order,
/// which the Firestore range queries rely on.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_utc_rfc3339(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|d| d.with_timezone(&Utc))
}

/// A calendar week, Monday 00:00:00 through Sunday 23:59:59 (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    /// Window beginning at `start`, ending six days, 23:59:59 later.
    pub fn starting(start: DateTime<Utc>) -> Self {
        let end = start + Duration::days(6) + Duration::hours(23) + Duration::minutes(59)
            + Duration::seconds(59);
        Self { start, end }
    }

    /// The week containing `now`.
    pub fn containing(now: DateTime<Utc>) -> Self {
        let days_since_monday = i64::from(now.weekday().num_days_from_monday());
        let monday = now.date_naive() - Duration::days(days_since_monday);
        Self::starting(monday.and_time(NaiveTime::default()).and_utc())
    }

    /// "January 15 - January 21, 2024"
    pub fn describe(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%B %d"),
            self.end.format("%B %d, %Y")
        )
    }
}
