// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! netCDF output
//!
//! One unlimited `time` dimension; `time` holds minutes since the Unix epoch
//! and every field in [`NETCDF_VARIABLES`] is a `f64` variable over it. The
//! unlimited dimension cannot shrink, so the committed row count lives in the
//! `committed` global attribute and rows past it are overwritten on the next
//! write.

use super::schema::NETCDF_VARIABLES;
use super::OutputStore;
use crate::error::StoreError;
use crate::record::OutputRecord;
use crate::time::TimePoint;
use log::debug;
use std::path::{Path, PathBuf};

const TIME: &str = "time";
const COMMITTED: &str = "committed";

/// Binary output for the model
#[derive(Debug)]
pub struct NetCdfStore {
    path: PathBuf,
    skip: i32,
    ifp_interval_minutes: u32,
    len: usize,
    first: Option<TimePoint>,
}

impl NetCdfStore {
    pub fn new(path: impl AsRef<Path>, skip: i32, ifp_interval_minutes: u32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            skip,
            ifp_interval_minutes,
            len: 0,
            first: None,
        }
    }

    fn create(&mut self) -> Result<(), StoreError> {
        let mut file = netcdf::create(&self.path)?;
        file.add_unlimited_dimension(TIME)?;
        file.add_attribute("skip", self.skip)?;
        file.add_attribute("ifp_interval", self.ifp_interval_minutes as i32)?;
        file.add_attribute(COMMITTED, 0i32)?;

        let mut time = file.add_variable::<f64>(TIME, &[TIME])?;
        time.put_attribute("units", "minutes since 1970-01-01 00:00:00")?;
        for field in NETCDF_VARIABLES {
            let mut var = file.add_variable::<f64>(field.name(), &[TIME])?;
            if let Some(units) = field.units() {
                var.put_attribute("units", units)?;
            }
        }
        self.len = 0;
        self.first = None;
        Ok(())
    }

    fn load(&mut self) -> Result<(), StoreError> {
        let file = netcdf::open(&self.path)?;
        let rows = file.dimension(TIME).map(|d| d.len()).unwrap_or(0);
        let committed = match file.attribute(COMMITTED).map(|a| a.value()).transpose()? {
            Some(netcdf::AttributeValue::Int(n)) => (n.max(0) as usize).min(rows),
            _ => rows,
        };
        self.first = if committed > 0 {
            let var = file.variable(TIME).ok_or_else(|| self.corrupt("no time variable"))?;
            let minutes: f64 = var.get_value([0usize])?;
            TimePoint::from_epoch_minutes(minutes as i64)
        } else {
            None
        };
        self.len = committed;
        debug!("{}: {} committed rows", self.path.display(), self.len);
        Ok(())
    }

    fn corrupt(&self, reason: &str) -> StoreError {
        StoreError::Corrupt {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn set_committed(&self, file: &mut netcdf::FileMut, len: usize) -> Result<(), StoreError> {
        file.add_attribute(COMMITTED, len as i32)?;
        Ok(())
    }
}

impl OutputStore for NetCdfStore {
    fn name(&self) -> &'static str {
        "netcdf"
    }

    fn len(&self) -> usize {
        self.len
    }

    fn first_time(&self) -> Option<TimePoint> {
        self.first
    }

    fn prepare(&mut self, append: bool) -> Result<(), StoreError> {
        if append && self.path.exists() {
            self.load()
        } else {
            self.create()
        }
    }

    fn write_at(&mut self, index: usize, records: &[OutputRecord]) -> Result<(), StoreError> {
        if index > self.len {
            return Err(StoreError::NonContiguous {
                len: self.len,
                index,
            });
        }
        let end = index + records.len();
        let mut file = netcdf::append(&self.path)?;

        let times: Vec<f64> = records
            .iter()
            .map(|r| r.time.epoch_minutes() as f64)
            .collect();
        file.variable_mut(TIME)
            .ok_or_else(|| self.corrupt("no time variable"))?
            .put_values(&times, index..end)?;

        for field in NETCDF_VARIABLES {
            let data: Vec<f64> = records.iter().map(|r| r.get(field)).collect();
            file.variable_mut(field.name())
                .ok_or_else(|| self.corrupt(field.name()))?
                .put_values(&data, index..end)?;
        }
        self.set_committed(&mut file, end)?;

        if index == 0 {
            self.first = records.first().map(|r| r.time);
        }
        self.len = end;
        Ok(())
    }

    fn truncate(&mut self, len: usize) -> Result<(), StoreError> {
        if len >= self.len {
            return Ok(());
        }
        let mut file = netcdf::append(&self.path)?;
        self.set_committed(&mut file, len)?;
        self.len = len;
        if len == 0 {
            self.first = None;
        }
        Ok(())
    }
}
