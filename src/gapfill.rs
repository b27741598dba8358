// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Gap filling and relaxation
//!
//! Two mechanisms turn a sparse series into a dense one:
//!
//! - **Interior fill**: piecewise-linear interpolation between readings that
//!   are inside the raw domain, with flat extrapolation at both ends.
//! - **Relaxation**: minutes that interior fill does not cover are resolved by
//!   a backward search that blends the most recent resolved value toward a
//!   baseline. Applied in a forward scan, the blend compounds minute by
//!   minute, so a stale observation decays exponentially toward the baseline.

use crate::config::GapFillConfig;
use crate::series::SparseSeries;
use crate::time::{TimePoint, TimeRange};

/// Trust placed in a reading `distance` minutes old
pub fn relaxation_weight(distance: u32, time_constant_minutes: f64) -> f64 {
    (-(distance as f64) / time_constant_minutes).exp()
}

/// Blend the nearest earlier reading toward `baseline`
///
/// Looks at `t-1` through `t-max_search`; the first hit at offset `i` gives
/// `baseline * (1 - w) + found * w` with `w = exp(-i / time_constant)`.
/// Without a hit the baseline is returned unchanged.
pub fn backward_search(
    series: &SparseSeries,
    t: TimePoint,
    baseline: f64,
    config: &GapFillConfig,
) -> f64 {
    for distance in 1..=config.max_search_minutes {
        if let Some(found) = series.get(t.minus_minutes(distance as i64)) {
            let w = relaxation_weight(distance, config.time_constant_minutes);
            return baseline * (1.0 - w) + found * w;
        }
    }
    baseline
}

/// Dense piecewise-linear fill of `raw`
///
/// Slots before the first reading take the first reading and slots after the
/// last take the last. With `cutoff` the output ends at the last reading
/// instead. An all-missing input yields an empty vector.
pub fn linear_interior_fill(raw: &[Option<f64>], cutoff: bool) -> Vec<f64> {
    let known: Vec<(usize, f64)> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i, x)))
        .collect();

    let (first, last) = match (known.first(), known.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };

    let len = if cutoff { last.0 + 1 } else { raw.len() };
    let mut out = Vec::with_capacity(len);
    let mut segment = 0;

    for i in 0..len {
        if i <= first.0 {
            out.push(first.1);
            continue;
        }
        if i >= last.0 {
            out.push(last.1);
            continue;
        }
        while known[segment + 1].0 < i {
            segment += 1;
        }
        let (x0, y0) = known[segment];
        let (x1, y1) = known[segment + 1];
        let frac = (i - x0) as f64 / (x1 - x0) as f64;
        out.push(y0 + frac * (y1 - y0));
    }
    out
}

/// Raw readings of one field plus how to fill them
#[derive(Debug, Clone, Copy)]
pub struct FillPlan {
    /// Minutes over which interior fill applies
    pub domain: TimeRange,
    /// Stop interior fill at the last reading
    pub cutoff: bool,
    /// Minutes that must be resolved
    pub target: TimeRange,
}

/// Densifies sparse series
#[derive(Debug, Clone, Default)]
pub struct GapFiller {
    config: GapFillConfig,
}

impl GapFiller {
    pub fn new(config: GapFillConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GapFillConfig {
        &self.config
    }

    /// See [`backward_search`]
    pub fn backward_search(&self, series: &SparseSeries, t: TimePoint, baseline: f64) -> f64 {
        backward_search(series, t, baseline, &self.config)
    }

    /// Resolve every minute of `plan.target`
    ///
    /// Interior fill runs first over `plan.domain`. The remaining minutes are
    /// resolved in time order by backward search against the values resolved
    /// so far, with `baseline(t)` as the relaxation target. `raw` is not
    /// modified. The result holds exactly the target minutes.
    pub fn densify<B>(&self, raw: &SparseSeries, plan: &FillPlan, mut baseline: B) -> SparseSeries
    where
        B: FnMut(TimePoint) -> f64,
    {
        let filled = linear_interior_fill(&raw.slots(plan.domain), plan.cutoff);
        let mut resolved: SparseSeries = plan
            .domain
            .iter()
            .zip(filled)
            .collect();

        for t in plan.target.iter() {
            if !resolved.contains(t) {
                let value = self.backward_search(&resolved, t, baseline(t));
                resolved.insert(t, value);
            }
        }
        resolved.restrict(plan.target)
    }
}
