// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types
//!
//! Every struct has a `Default` matching the operational constants and can be
//! loaded from JSON; missing keys take their default.

use crate::error::ConfigError;
use crate::field::FieldGroup;
use crate::time::TimePoint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// L1-to-Earth propagation delay of the realtime products (minutes)
pub const L1_DELAY_MINUTES: i64 = 50;

/// Publication gap of the geospace input files (minutes)
pub const GEOSPACE_TIME_GAP_MINUTES: i64 = 3;

/// Solar-wind running-average interval (minutes)
pub const AVERAGING_INTERVAL_MINUTES: u32 = 20;

/// Relaxation e-folding time (minutes)
pub const TIME_CONSTANT_MINUTES: f64 = 300.0;

/// How far back a backward search looks (minutes)
pub const MAX_SEARCH_DISTANCE_MINUTES: u32 = 1;

/// Gap filling and relaxation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapFillConfig {
    /// e-folding time of the trust placed in a stale observation
    pub time_constant_minutes: f64,
    /// Maximum backward search offset
    pub max_search_minutes: u32,
    /// Relax the F10.7 average toward the mean of its own observations
    /// instead of the flux floor
    pub flux_average_self_mean: bool,
}

impl Default for GapFillConfig {
    fn default() -> Self {
        Self {
            time_constant_minutes: TIME_CONSTANT_MINUTES,
            max_search_minutes: MAX_SEARCH_DISTANCE_MINUTES,
            flux_average_self_mean: false,
        }
    }
}

impl GapFillConfig {
    /// Create a configuration with a custom search distance
    pub fn with_max_search(max_search_minutes: u32) -> Self {
        Self {
            max_search_minutes,
            ..Default::default()
        }
    }
}

/// Which sources feed the solar-wind and hemispheric-power fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Read the realtime L1 and aurora products
    #[default]
    Observed,
    /// Bulletin only; everything else comes from relaxation formulas
    Derived,
}

/// Source locations and reporting delays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Root of the dated input tree
    pub root: PathBuf,
    /// Data-source selection
    pub mode: SourceMode,
    /// Minute `t` is read from the geospace file stamped `t - delay`.
    ///
    /// Published variants of this offset disagree in sign and size; the
    /// default is the L1 delay plus the geospace publication gap.
    pub solar_wind_delay_minutes: i64,
    /// Offset added to aurora-power table times
    pub aurora_power_delay_minutes: i64,
    /// Running-average interval applied to solar-wind fields
    pub averaging_interval_minutes: u32,
    /// Bulletin coverage from its first time tag
    pub bulletin_coverage_minutes: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            mode: SourceMode::Observed,
            solar_wind_delay_minutes: L1_DELAY_MINUTES + GEOSPACE_TIME_GAP_MINUTES,
            aurora_power_delay_minutes: L1_DELAY_MINUTES,
            averaging_interval_minutes: AVERAGING_INTERVAL_MINUTES,
            bulletin_coverage_minutes: 7 * 24 * 60 + 1,
        }
    }
}

impl SourceConfig {
    /// Create a configuration rooted at `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Lookback needed before the output range by `group`
    ///
    /// The delayed sources need the averaging interval plus their own delay.
    pub fn lookback_minutes(&self, group: FieldGroup) -> u32 {
        let delay = match group {
            FieldGroup::SolarWind => self.solar_wind_delay_minutes,
            FieldGroup::AuroraPower => self.aurora_power_delay_minutes,
            FieldGroup::Bulletin | FieldGroup::Derived => return 0,
        };
        self.averaging_interval_minutes + delay.max(0) as u32
    }
}

/// Output stores and markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Fixed-width text table
    pub text_path: Option<PathBuf>,
    /// netCDF file (requires the `netcdf` feature)
    pub netcdf_path: Option<PathBuf>,
    /// Extend existing stores instead of recreating them
    pub append: bool,
    /// Coupled-model run; sets the skip offset attribute
    pub coupled: bool,
    /// Model input-parameter read interval (minutes)
    pub ifp_interval_minutes: u32,
    /// Directory receiving one `.lock` marker per committed segment
    pub lock_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            text_path: Some(PathBuf::from("wam_input_f107_kp.txt")),
            netcdf_path: None,
            append: false,
            coupled: false,
            ifp_interval_minutes: 1,
            lock_dir: None,
        }
    }
}

/// Full driver configuration (the control surface)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// First output minute
    pub start: TimePoint,
    /// The driver stops once the window start reaches this minute
    pub end: TimePoint,
    /// Output minutes per cycle
    pub segment_minutes: u32,
    /// Force processing after waiting this long for data
    pub max_wait_minutes: u32,
    /// Sleep between availability polls
    pub poll_interval_secs: u64,
    /// Poll sources before each segment; off for one-shot runs
    pub wait_for_data: bool,
    pub sources: SourceConfig,
    pub gapfill: GapFillConfig,
    pub output: OutputConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        let start = TimePoint::from_ymd_hm(2021, 2, 17, 0, 15).unwrap_or_else(TimePoint::now);
        Self {
            start,
            end: start.plus_minutes(24 * 60),
            segment_minutes: 15,
            max_wait_minutes: 60,
            poll_interval_secs: 60,
            wait_for_data: true,
            sources: SourceConfig::default(),
            gapfill: GapFillConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Load from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json_file_with_end(path).map(|(config, _)| config)
    }

    /// Load from a JSON file; the flag is set when the file gives `end`
    pub fn from_json_file_with_end(path: &Path) -> Result<(Self, bool), ConfigError> {
        let file_error = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| file_error(e.to_string()))?;
        let has_end = value.get("end").is_some();
        let config = serde_json::from_value(value).map_err(|e| file_error(e.to_string()))?;
        Ok((config, has_end))
    }

    /// Reject inconsistent settings before the loop starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start >= self.end {
            return Err(ConfigError::StartNotBeforeEnd {
                start: self.start.to_compact(),
                end: self.end.to_compact(),
            });
        }
        if self.segment_minutes == 0 {
            return Err(ConfigError::EmptySegment);
        }
        if !(self.gapfill.time_constant_minutes > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "time_constant_minutes",
                reason: format!("must be positive, got {}", self.gapfill.time_constant_minutes),
            });
        }
        if self.sources.averaging_interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                name: "averaging_interval_minutes",
                reason: "must be at least one minute".to_string(),
            });
        }
        if self.output.text_path.is_none() && self.output.netcdf_path.is_none() {
            return Err(ConfigError::InvalidValue {
                name: "output",
                reason: "at least one output store is required".to_string(),
            });
        }
        if self.output.netcdf_path.is_some() && !cfg!(feature = "netcdf") {
            return Err(ConfigError::InvalidValue {
                name: "netcdf_path",
                reason: "built without the `netcdf` feature".to_string(),
            });
        }
        Ok(())
    }

    /// Coupling-mode skip offset written to the binary output
    pub fn skip_offset(&self) -> i32 {
        if self.output.coupled {
            1
        } else {
            0
        }
    }
}
