// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Source adapters
//!
//! One adapter per upstream product. Adapters never fail: a missing file,
//! malformed document or out-of-range timestamp becomes absent readings, which
//! the gap filler later resolves. Per-file problems are logged at debug level.

mod aurora_power;
mod bulletin;
mod solar_wind;

pub use aurora_power::AuroraPowerSource;
pub use bulletin::BulletinSource;
pub use solar_wind::SolarWindSource;

use crate::config::{SourceConfig, SourceMode};
use crate::field::{Field, FieldGroup};
use crate::series::SparseSeries;
use crate::time::{TimePoint, TimeRange};
use crate::window::SlidingWindow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Readings of one source for one window
#[derive(Debug, Clone, PartialEq)]
pub struct RawReadings {
    /// Minutes over which interior fill applies
    pub domain: TimeRange,
    /// Stop interior fill at the last reading
    pub cutoff: bool,
    /// Sparse readings per field
    pub series: BTreeMap<Field, SparseSeries>,
}

impl RawReadings {
    /// No readings over `domain`
    pub fn empty(domain: TimeRange, cutoff: bool) -> Self {
        Self {
            domain,
            cutoff,
            series: BTreeMap::new(),
        }
    }

    /// Record one reading
    pub fn insert(&mut self, field: Field, t: TimePoint, value: f64) {
        self.series.entry(field).or_default().insert(t, value);
    }

    pub fn field(&self, field: Field) -> Option<&SparseSeries> {
        self.series.get(&field)
    }

    /// Total number of readings across fields
    pub fn count(&self) -> usize {
        self.series.values().map(SparseSeries::len).sum()
    }
}

/// An upstream product feeding one field group
pub trait SourceAdapter {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Fields this source supplies
    fn group(&self) -> FieldGroup;

    /// Whether the driver waits for this source before processing
    fn is_polled(&self) -> bool {
        true
    }

    /// Most recent data time available, `None` when nothing can be found
    fn latest_available(&self) -> Option<TimePoint>;

    /// Read everything relevant to `window`
    fn read(&self, window: &SlidingWindow) -> RawReadings;
}

/// Adapters selected by the configured mode
pub fn for_config(config: &SourceConfig) -> Vec<Box<dyn SourceAdapter>> {
    let mut sources: Vec<Box<dyn SourceAdapter>> = vec![Box::new(BulletinSource::new(config))];
    if config.mode == SourceMode::Observed {
        sources.push(Box::new(SolarWindSource::new(config)));
        sources.push(Box::new(AuroraPowerSource::new(config)));
    }
    sources
}

/// Files under `{root}/*/{subdir}` whose names start with `prefix`
pub(crate) fn find_dated_files(root: &Path, subdir: &str, prefix: &str) -> Vec<PathBuf> {
    let Ok(days) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for day in days.flatten() {
        let dir = day.path().join(subdir);
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        files.extend(
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(prefix))
                }),
        );
    }
    files.sort();
    files
}

/// Parse a numeric field, mapping failures to a source error
pub(crate) fn parse_number(
    text: Option<&str>,
    what: &str,
    path: &Path,
) -> Result<f64, crate::error::SourceError> {
    let text = text.ok_or_else(|| crate::error::SourceError::Missing {
        what: what.to_string(),
        path: path.display().to_string(),
    })?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| crate::error::SourceError::Malformed {
            value: text.to_string(),
            path: path.display().to_string(),
        })
}
