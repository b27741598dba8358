// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sliding processing window
//!
//! ```text
//!   start - lookback            start              start + segment
//!        |<---- lookback ---->|<---- output ---->|
//! ```
//!
//! Each group reads its own lookback plus the output range. Only the output
//! range is ever emitted.

use crate::config::SourceConfig;
use crate::field::FieldGroup;
use crate::time::{TimePoint, TimeRange};

/// Lookback and output ranges of one driver cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindow {
    start: TimePoint,
    segment_minutes: u32,
    solar_wind_lookback: u32,
    aurora_power_lookback: u32,
}

impl SlidingWindow {
    /// Window whose output starts at `start`
    pub fn new(start: TimePoint, segment_minutes: u32, sources: &SourceConfig) -> Self {
        Self {
            start,
            segment_minutes,
            solar_wind_lookback: sources.lookback_minutes(FieldGroup::SolarWind),
            aurora_power_lookback: sources.lookback_minutes(FieldGroup::AuroraPower),
        }
    }

    /// First output minute
    pub fn start(&self) -> TimePoint {
        self.start
    }

    pub fn segment_minutes(&self) -> u32 {
        self.segment_minutes
    }

    /// Minutes emitted by this cycle
    pub fn output_range(&self) -> TimeRange {
        TimeRange::with_length(self.start, self.segment_minutes)
    }

    /// Data time the sources must reach before the cycle runs
    pub fn target_end(&self) -> TimePoint {
        self.output_range().end
    }

    /// Minutes read before the output range
    pub fn lookback(&self, group: FieldGroup) -> u32 {
        match group {
            FieldGroup::SolarWind => self.solar_wind_lookback,
            FieldGroup::AuroraPower => self.aurora_power_lookback,
            FieldGroup::Bulletin | FieldGroup::Derived => 0,
        }
    }

    /// Lookback plus output for `group`
    pub fn group_range(&self, group: FieldGroup) -> TimeRange {
        let output = self.output_range();
        TimeRange::new(output.start.minus_minutes(self.lookback(group) as i64), output.end)
    }

    /// Union of every group's range
    pub fn full_range(&self) -> TimeRange {
        [
            FieldGroup::Bulletin,
            FieldGroup::SolarWind,
            FieldGroup::AuroraPower,
            FieldGroup::Derived,
        ]
        .iter()
        .map(|g| self.group_range(*g))
        .fold(self.output_range(), |acc, r| acc.union(&r))
    }

    /// Shift by one segment
    pub fn advance(&mut self) {
        self.start = self.start.plus_minutes(self.segment_minutes as i64);
    }
}
