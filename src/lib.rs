// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # WAM Input - Space weather driver preparation
//!
//! Turns ragged, delayed and partially missing space weather observations
//! into gap-free per-minute driver series for the Whole Atmosphere Model.
//!
//! ## Key Features
//!
//! - **Gap filling**: linear interior fill between observations
//! - **Relaxation**: stale observations decay exponentially toward
//!   climatological or physically derived baselines
//! - **Derived fields**: field magnitude and angle, velocity, hemispheric
//!   power and its index, Ap
//! - **Realtime driver**: sliding window that waits for late data, commits
//!   each segment atomically and resumes from its own output
//!
//! ## Quick Start
//!
//! ```rust
//! use wam_input::{FillPlan, GapFiller, SparseSeries, TimePoint, TimeRange};
//!
//! let t0 = TimePoint::parse_compact("202102170000").unwrap();
//! let raw: SparseSeries = [(t0, 4.0), (t0.plus_minutes(2), 2.0)].into_iter().collect();
//!
//! let plan = FillPlan {
//!     domain: TimeRange::with_length(t0, 3),
//!     cutoff: true,
//!     target: TimeRange::with_length(t0, 60),
//! };
//! // Past the last reading, values relax toward Kp = 2
//! let dense = GapFiller::default().densify(&raw, &plan, |_| 2.0);
//! assert_eq!(dense.len(), 60);
//! assert_eq!(dense.get(t0.plus_minutes(1)), Some(3.0));
//! ```
//!
//! ## Modules
//!
//! - [`time`]: minute-resolution keys and ranges
//! - [`field`]: the field set and relaxation rules
//! - [`series`]: sparse series and running averages
//! - [`gapfill`]: interior fill and backward search
//! - [`derived`]: physical formulas
//! - [`baseline`]: relaxation dependency ordering
//! - [`sources`]: bulletin, solar-wind and hemispheric-power readers
//! - [`processor`]: one window from raw files to records
//! - [`output`]: text and netCDF stores
//! - [`driver`]: the realtime loop

// Modules
pub mod baseline;
pub mod config;
pub mod derived;
pub mod driver;
pub mod error;
pub mod field;
pub mod gapfill;
pub mod output;
pub mod processor;
pub mod record;
pub mod series;
pub mod sources;
pub mod time;
pub mod window;

// Re-exports for convenient access
pub use baseline::RelaxationGraph;
pub use config::{DriverConfig, GapFillConfig, OutputConfig, SourceConfig, SourceMode};
pub use driver::{Clock, DriverState, DriverStats, ManualClock, RealtimeDriver, SystemClock};
pub use error::{ConfigError, Result, SourceError, StoreError, WamError};
pub use field::{Field, FieldGroup, Relaxation};
pub use gapfill::{backward_search, linear_interior_fill, FillPlan, GapFiller};
pub use output::{OutputStore, TextStore};
pub use processor::WindowProcessor;
pub use record::{Flag, OutputRecord};
pub use series::SparseSeries;
pub use sources::{AuroraPowerSource, BulletinSource, RawReadings, SolarWindSource, SourceAdapter};
pub use time::{TimePoint, TimeRange};
pub use window::SlidingWindow;

#[cfg(feature = "netcdf")]
pub use output::NetCdfStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
