// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Output stores
//!
//! A store holds one row per minute, contiguous from its first row. Writes are
//! positional: committing records that start inside the store replaces
//! everything from that row on, so retrying a failed segment overwrites
//! whatever part of it made it to disk.

pub mod schema;
mod text;

#[cfg(feature = "netcdf")]
mod netcdf;

#[cfg(feature = "netcdf")]
pub use self::netcdf::NetCdfStore;
pub use text::TextStore;

use crate::config::{DriverConfig, OutputConfig};
use crate::error::StoreError;
use crate::record::OutputRecord;
use crate::time::TimePoint;
use log::warn;

/// Persistent, append-mostly record store
pub trait OutputStore {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Number of stored rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time of the first stored row
    fn first_time(&self) -> Option<TimePoint>;

    /// Open the store, recreating it unless `append` is set
    fn prepare(&mut self, append: bool) -> Result<(), StoreError>;

    /// Keep the first `index` rows and write `records` after them
    fn write_at(&mut self, index: usize, records: &[OutputRecord]) -> Result<(), StoreError>;

    /// Keep only the first `len` rows
    fn truncate(&mut self, len: usize) -> Result<(), StoreError>;

    /// Minute after the last stored row
    fn next_start(&self) -> Option<TimePoint> {
        self.first_time()
            .map(|first| first.plus_minutes(self.len() as i64))
    }

    /// Write `records` at the row matching their first time
    fn commit(&mut self, records: &[OutputRecord]) -> Result<(), StoreError> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let index = match self.first_time() {
            Some(origin) if !self.is_empty() => {
                let offset = first.time.minutes_since(origin);
                if offset < 0 {
                    return Err(StoreError::BeforeOrigin {
                        origin: origin.to_string(),
                    });
                }
                offset as usize
            }
            _ => 0,
        };
        if index > self.len() {
            return Err(StoreError::NonContiguous {
                len: self.len(),
                index,
            });
        }
        self.write_at(index, records)
    }
}

/// Stores named by the output configuration, prepared for writing
pub fn open_stores(
    config: &DriverConfig,
    issue: TimePoint,
) -> Result<Vec<Box<dyn OutputStore>>, StoreError> {
    let output: &OutputConfig = &config.output;
    let mut stores: Vec<Box<dyn OutputStore>> = Vec::new();
    if let Some(path) = &output.text_path {
        stores.push(Box::new(TextStore::new(path, issue)));
    }
    #[cfg(feature = "netcdf")]
    if let Some(path) = &output.netcdf_path {
        stores.push(Box::new(NetCdfStore::new(
            path,
            config.skip_offset(),
            output.ifp_interval_minutes,
        )));
    }
    for store in stores.iter_mut() {
        store.prepare(output.append)?;
    }
    Ok(stores)
}

/// Where a resumed run starts: the earliest end among populated stores
///
/// Empty stores do not hold the start back, so they never receive the rows
/// written before it; each one is reported.
pub fn resume_start(stores: &[Box<dyn OutputStore>]) -> Option<TimePoint> {
    let start = stores.iter().filter_map(|s| s.next_start()).min()?;
    for store in stores.iter().filter(|s| s.next_start().is_none()) {
        warn!(
            "{} store is empty while others resume at {}; it will lack every earlier row",
            store.name(),
            start
        );
    }
    Some(start)
}
