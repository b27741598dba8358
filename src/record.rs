// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Output rows

use crate::field::Field;
use crate::time::TimePoint;
use std::collections::BTreeMap;
use std::fmt;

/// Provenance flag written next to F10.7 and Kp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flag {
    Forecast = 0,
    Estimated = 1,
    Observed = 2,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Honors the caller's width and alignment
        fmt::Display::fmt(&(*self as u8), f)
    }
}

/// Every field at one minute
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub time: TimePoint,
    pub f107_flag: Flag,
    pub kp_flag: Flag,
    values: BTreeMap<Field, f64>,
}

impl OutputRecord {
    /// Record with the standard flags: F10.7 observed, Kp estimated
    pub fn new(time: TimePoint, values: BTreeMap<Field, f64>) -> Self {
        Self {
            time,
            f107_flag: Flag::Observed,
            kp_flag: Flag::Estimated,
            values,
        }
    }

    /// Value of `field`; NaN if the record lacks it
    pub fn get(&self, field: Field) -> f64 {
        self.values.get(&field).copied().unwrap_or(f64::NAN)
    }

    /// Integer class of a power index field
    pub fn index(&self, field: Field) -> u8 {
        let v = self.get(field);
        if v.is_finite() {
            v.round().clamp(0.0, u8::MAX as f64) as u8
        } else {
            0
        }
    }

    /// Whether every field holds a finite value
    pub fn is_complete(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_finite())
    }
}
