// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sparse minute-keyed series
//!
//! A missing key means "not yet observed". Nothing in this module fails on
//! absence: callers resolve it through [`SparseSeries::get_or_relax`] or the
//! [`GapFiller`](crate::gapfill::GapFiller).

use crate::config::GapFillConfig;
use crate::gapfill::backward_search;
use crate::time::{TimePoint, TimeRange};
use std::collections::BTreeMap;

/// Ordered map of minute to reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseSeries {
    values: BTreeMap<TimePoint, f64>,
}

impl SparseSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading; non-finite values count as missing
    pub fn insert(&mut self, t: TimePoint, value: f64) {
        if value.is_finite() {
            self.values.insert(t, value);
        } else {
            self.values.remove(&t);
        }
    }

    pub fn get(&self, t: TimePoint) -> Option<f64> {
        self.values.get(&t).copied()
    }

    pub fn contains(&self, t: TimePoint) -> bool {
        self.values.contains_key(&t)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Readings in time order
    pub fn iter(&self) -> impl Iterator<Item = (TimePoint, f64)> + '_ {
        self.values.iter().map(|(t, v)| (*t, *v))
    }

    pub fn first_time(&self) -> Option<TimePoint> {
        self.values.keys().next().copied()
    }

    pub fn last_time(&self) -> Option<TimePoint> {
        self.values.keys().next_back().copied()
    }

    /// Mean of the stored readings
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.values().sum::<f64>() / self.values.len() as f64)
    }

    /// Readings inside `range` only
    pub fn restrict(&self, range: TimeRange) -> SparseSeries {
        Self {
            values: self
                .values
                .range(range.start..range.end)
                .map(|(t, v)| (*t, *v))
                .collect(),
        }
    }

    /// Per-minute slots over `range`, `None` where unobserved
    pub fn slots(&self, range: TimeRange) -> Vec<Option<f64>> {
        range.iter().map(|t| self.get(t)).collect()
    }

    /// Causal moving average over the `window` most recent readings
    ///
    /// Each output averages the current reading and the `window - 1` before
    /// it, in key order. History before the first reading is padded with that
    /// first reading, so a constant series averages to itself from the start.
    pub fn running_average(&self, window: usize) -> SparseSeries {
        if window <= 1 || self.values.is_empty() {
            return self.clone();
        }
        let keys: Vec<TimePoint> = self.values.keys().copied().collect();
        let vals: Vec<f64> = self.values.values().copied().collect();
        let first = vals[0];

        let mut padded = vec![first; window - 1];
        padded.extend_from_slice(&vals);

        // prefix[k] = sum of padded[..k]
        let mut prefix = Vec::with_capacity(padded.len() + 1);
        prefix.push(0.0);
        for v in &padded {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + v);
        }

        let values = keys
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                let end = i + window;
                (t, (prefix[end] - prefix[i]) / window as f64)
            })
            .collect();
        Self { values }
    }

    /// Value at `t`, falling back to backward search, then the baseline
    ///
    /// Reads only; unlike a default-inserting map, nothing is cached.
    pub fn get_or_relax(&self, t: TimePoint, baseline: f64, config: &GapFillConfig) -> f64 {
        match self.get(t) {
            Some(v) => v,
            None => backward_search(self, t, baseline, config),
        }
    }
}

impl FromIterator<(TimePoint, f64)> for SparseSeries {
    fn from_iter<I: IntoIterator<Item = (TimePoint, f64)>>(iter: I) -> Self {
        let mut series = SparseSeries::new();
        for (t, v) in iter {
            series.insert(t, v);
        }
        series
    }
}
