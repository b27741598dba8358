// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Hemispheric power reader
//!
//! Daily whitespace-separated tables at
//! `{root}/{%Y%m%d}/swpc/wam/swpc_aurora_power_{%Y%m%d}.txt`. Lines starting
//! with `#` are comments. A data line starts with the observation date and
//! time and ends with the north and south power in GW. Table times are
//! shifted forward by the reporting delay.

use super::{find_dated_files, parse_number, RawReadings, SourceAdapter};
use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::field::{Field, FieldGroup};
use crate::time::{TimePoint, PATH_FMT};
use crate::window::SlidingWindow;
use chrono::NaiveDate;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

const SUBDIR: &str = "swpc/wam";
const PREFIX: &str = "swpc_aurora_power_";

/// `date time` columns
const SPLIT_FMT: &str = "%Y-%m-%d %H:%M";
/// Single `date_time` column
const JOINED_FMT: &str = "%Y-%m-%d_%H:%M";

/// One table row: observation time, north, south
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerRow {
    pub time: TimePoint,
    pub north: f64,
    pub south: f64,
}

/// Parse a data line; `None` for comments and blank lines
pub fn parse_line(line: &str, path: &Path) -> Option<Result<PowerRow, SourceError>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let cols: Vec<&str> = trimmed.split_whitespace().collect();
    Some(parse_columns(&cols, path))
}

fn parse_columns(cols: &[&str], path: &Path) -> Result<PowerRow, SourceError> {
    let malformed = || SourceError::Malformed {
        value: cols.join(" "),
        path: path.display().to_string(),
    };
    if cols.len() < 3 {
        return Err(malformed());
    }
    let time = cols
        .get(1)
        .and_then(|c| TimePoint::parse(&format!("{} {}", cols[0], c), SPLIT_FMT).ok())
        .or_else(|| TimePoint::parse(cols[0], JOINED_FMT).ok())
        .ok_or_else(malformed)?;
    let north = parse_number(cols.get(cols.len() - 2).copied(), "north power", path)?;
    let south = parse_number(cols.last().copied(), "south power", path)?;
    Ok(PowerRow { time, north, south })
}

/// Daily hemispheric power tables
#[derive(Debug, Clone)]
pub struct AuroraPowerSource {
    root: PathBuf,
    delay_minutes: i64,
}

impl AuroraPowerSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            root: config.root.clone(),
            delay_minutes: config.aurora_power_delay_minutes,
        }
    }

    /// Table for one day
    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        let stamp = day.format(PATH_FMT).to_string();
        self.root
            .join(&stamp)
            .join(SUBDIR)
            .join(format!("{}{}.txt", PREFIX, stamp))
    }

    fn read_table(path: &Path) -> Result<Vec<PowerRow>, SourceError> {
        let text = fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        let mut rows = Vec::new();
        for parsed in text.lines().filter_map(|l| parse_line(l, path)) {
            match parsed {
                Ok(row) => rows.push(row),
                Err(e) => debug!("{}", e),
            }
        }
        Ok(rows)
    }
}

impl SourceAdapter for AuroraPowerSource {
    fn name(&self) -> &'static str {
        "aurora_power"
    }

    fn group(&self) -> FieldGroup {
        FieldGroup::AuroraPower
    }

    /// Last row of the newest table plus the delay
    fn latest_available(&self) -> Option<TimePoint> {
        let files = find_dated_files(&self.root, SUBDIR, PREFIX);
        let newest = files.last()?;
        let text = fs::read_to_string(newest).ok()?;
        let last = text.lines().rev().find_map(|l| parse_line(l, newest))?;
        match last {
            Ok(row) => Some(row.time.plus_minutes(self.delay_minutes)),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }

    fn read(&self, window: &SlidingWindow) -> RawReadings {
        let range = window.group_range(FieldGroup::AuroraPower);
        let mut readings = RawReadings::empty(range, true);
        // A row stamped on the previous day can land in range after the delay.
        let lookup = crate::time::TimeRange::new(
            range.start.minus_minutes(self.delay_minutes.max(0)),
            range.end,
        );
        for day in lookup.days() {
            let path = self.path_for(day);
            let rows = match Self::read_table(&path) {
                Ok(rows) => rows,
                Err(e) => {
                    debug!("{}", e);
                    continue;
                }
            };
            for row in rows {
                let t = row.time.plus_minutes(self.delay_minutes);
                if range.contains(t) {
                    readings.insert(Field::HemiPowerNorth, t, row.north);
                    readings.insert(Field::HemiPowerSouth, t, row.south);
                }
            }
        }
        readings
    }
}
