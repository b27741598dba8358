// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Minute-resolution time keys
//!
//! Every series in the crate is keyed by [`TimePoint`]. Seconds and
//! sub-seconds are dropped on construction, so two readings taken within the
//! same minute land on the same key.

use crate::error::ConfigError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Control surface format (`--start`, `--end`)
pub const COMPACT_FMT: &str = "%Y%m%d%H%M";

/// Bulletin time tags and output rows
pub const WAM_INPUT_FMT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Solar-wind file name stamp
pub const FILE_FMT: &str = "%Y%m%dT%H%M";

/// Daily directory name
pub const PATH_FMT: &str = "%Y%m%d";

/// Lock marker stamp
pub const LOCK_FMT: &str = "%Y%m%d_%H%M%S";

/// A UTC timestamp at one-minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimePoint(NaiveDateTime);

impl TimePoint {
    /// Create from a naive UTC datetime, truncating to the minute
    pub fn new(datetime: NaiveDateTime) -> Self {
        let truncated = datetime
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(datetime);
        Self(truncated)
    }

    /// Create from calendar fields; `None` when they do not form a valid time
    pub fn from_ymd_hm(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .map(Self)
    }

    /// Current wall-clock minute
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Parse with an explicit chrono format string
    pub fn parse(value: &str, format: &'static str) -> Result<Self, ConfigError> {
        NaiveDateTime::parse_from_str(value.trim(), format)
            .map(Self::new)
            .map_err(|_| ConfigError::InvalidTimestamp {
                value: value.to_string(),
                format,
            })
    }

    /// Parse the control surface format `YYYYMMDDhhmm`
    pub fn parse_compact(value: &str) -> Result<Self, ConfigError> {
        Self::parse(value, COMPACT_FMT)
    }

    /// Parse the bulletin/output format `YYYY-MM-DDThh:mm:ssZ`
    pub fn parse_iso(value: &str) -> Result<Self, ConfigError> {
        Self::parse(value, WAM_INPUT_FMT)
    }

    /// Build from whole minutes since the Unix epoch
    pub fn from_epoch_minutes(minutes: i64) -> Option<Self> {
        DateTime::from_timestamp(minutes.checked_mul(60)?, 0).map(|d| Self(d.naive_utc()))
    }

    /// Whole minutes since the Unix epoch
    pub fn epoch_minutes(&self) -> i64 {
        self.0.and_utc().timestamp().div_euclid(60)
    }

    /// Shift by a signed number of minutes
    pub fn plus_minutes(&self, minutes: i64) -> Self {
        Self(self.0 + Duration::minutes(minutes))
    }

    /// Shift backwards by a number of minutes
    pub fn minus_minutes(&self, minutes: i64) -> Self {
        self.plus_minutes(-minutes)
    }

    /// Signed minutes from `earlier` to `self`
    pub fn minutes_since(&self, earlier: TimePoint) -> i64 {
        (self.0 - earlier.0).num_minutes()
    }

    /// Calendar day of this minute
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Underlying naive datetime
    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// Format with a chrono format string
    pub fn format(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }

    /// Format as `YYYY-MM-DDThh:mm:ssZ`
    pub fn to_iso(&self) -> String {
        self.format(WAM_INPUT_FMT)
    }

    /// Format as `YYYYMMDDhhmm`
    pub fn to_compact(&self) -> String {
        self.format(COMPACT_FMT)
    }
}

impl From<DateTime<Utc>> for TimePoint {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value.naive_utc())
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso())
    }
}

impl TryFrom<String> for TimePoint {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_compact(&value)
    }
}

impl From<TimePoint> for String {
    fn from(value: TimePoint) -> Self {
        value.to_compact()
    }
}

/// Half-open range `[start, end)` of minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: TimePoint,
    pub end: TimePoint,
}

impl TimeRange {
    /// Create a range; an inverted range is treated as empty
    pub fn new(start: TimePoint, end: TimePoint) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Range of `minutes` starting at `start`
    pub fn with_length(start: TimePoint, minutes: u32) -> Self {
        Self::new(start, start.plus_minutes(minutes as i64))
    }

    /// Number of minutes in the range
    pub fn len(&self) -> usize {
        self.end.minutes_since(self.start).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, t: TimePoint) -> bool {
        t >= self.start && t < self.end
    }

    /// Zero-based position of `t`, if inside the range
    pub fn index_of(&self, t: TimePoint) -> Option<usize> {
        self.contains(t).then(|| t.minutes_since(self.start) as usize)
    }

    /// Smallest range covering both
    pub fn union(&self, other: &TimeRange) -> TimeRange {
        TimeRange::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Iterate every minute in order
    pub fn iter(&self) -> impl Iterator<Item = TimePoint> + '_ {
        let start = self.start;
        (0..self.len() as i64).map(move |i| start.plus_minutes(i))
    }

    /// Distinct calendar days touched by the range
    pub fn days(&self) -> Vec<NaiveDate> {
        if self.is_empty() {
            return Vec::new();
        }
        let first = self.start.date();
        let last = self.end.minus_minutes(1).date();
        first.iter_days().take_while(|d| *d <= last).collect()
    }
}
