// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! L1 solar-wind reader
//!
//! One XML file per minute at
//! `{root}/{%Y%m%d}/swpc/geospace_input-{%Y%m%dT%H%M}.xml`, holding a single
//! `data-item`. The reading for minute `t` is taken from the file stamped
//! `t - delay`.

use super::{find_dated_files, parse_number, RawReadings, SourceAdapter};
use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::field::{Field, FieldGroup};
use crate::time::{TimePoint, FILE_FMT, PATH_FMT};
use crate::window::SlidingWindow;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

const SUBDIR: &str = "swpc";
const PREFIX: &str = "geospace_input-";
const SUFFIX: &str = ".xml";

/// Child element and field
const CHILDREN: [(&str, Field); 5] = [
    ("mag_bx_gsm", Field::SwBx),
    ("mag_by_gsm", Field::SwBy),
    ("mag_bz_gsm", Field::SwBz),
    ("proton_speed", Field::SwVelocity),
    ("proton_density", Field::SwDensity),
];

/// Per-minute L1 magnetic field and plasma
#[derive(Debug, Clone)]
pub struct SolarWindSource {
    root: PathBuf,
    delay_minutes: i64,
}

impl SolarWindSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            root: config.root.clone(),
            delay_minutes: config.solar_wind_delay_minutes,
        }
    }

    /// File holding the reading for minute `t`
    pub fn path_for(&self, t: TimePoint) -> PathBuf {
        let stamp = t.minus_minutes(self.delay_minutes);
        self.root
            .join(stamp.format(PATH_FMT))
            .join(SUBDIR)
            .join(format!("{}{}{}", PREFIX, stamp.format(FILE_FMT), SUFFIX))
    }

    /// Readings present in one file; a missing child only drops that field
    fn read_file(path: &Path) -> Result<Vec<(Field, f64)>, SourceError> {
        let text = fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        let doc = roxmltree::Document::parse(&text).map_err(|e| SourceError::Xml {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let item = doc
            .root_element()
            .children()
            .find(|n| n.has_tag_name("data-item"))
            .ok_or_else(|| SourceError::Missing {
                what: "data-item".to_string(),
                path: path.display().to_string(),
            })?;

        let mut values = Vec::with_capacity(CHILDREN.len());
        for (tag, field) in CHILDREN {
            let text = item
                .children()
                .find(|c| c.has_tag_name(tag))
                .and_then(|c| c.text());
            match parse_number(text, tag, path) {
                Ok(v) => values.push((field, v)),
                Err(e) => debug!("{}", e),
            }
        }
        Ok(values)
    }

    fn stamp_of(path: &Path) -> Option<TimePoint> {
        let name = path.file_name()?.to_str()?;
        let stamp = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        TimePoint::parse(stamp, FILE_FMT).ok()
    }
}

impl SourceAdapter for SolarWindSource {
    fn name(&self) -> &'static str {
        "solar_wind"
    }

    fn group(&self) -> FieldGroup {
        FieldGroup::SolarWind
    }

    /// Newest file stamp plus the delay
    fn latest_available(&self) -> Option<TimePoint> {
        find_dated_files(&self.root, SUBDIR, PREFIX)
            .iter()
            .filter_map(|p| Self::stamp_of(p))
            .max()
            .map(|t| t.plus_minutes(self.delay_minutes))
    }

    fn read(&self, window: &SlidingWindow) -> RawReadings {
        let range = window.group_range(FieldGroup::SolarWind);
        let mut readings = RawReadings::empty(range, true);
        let mut missing = 0;
        for t in range.iter() {
            match Self::read_file(&self.path_for(t)) {
                Ok(values) => {
                    for (field, v) in values {
                        readings.insert(field, t, v);
                    }
                }
                Err(_) => missing += 1,
            }
        }
        debug!(
            "Solar wind: {} of {} minutes missing",
            missing,
            range.len()
        );
        readings
    }
}
