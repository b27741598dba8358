// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! One processing cycle: read, densify, derive, emit
//!
//! Every cycle starts from scratch over the whole window. Fields are resolved
//! in [`RelaxationGraph`] order over their own group range, widened to cover
//! whatever the fields depending on them need. Primary fields are gap-filled
//! and, for solar wind, averaged; derived fields are evaluated directly from
//! their resolved inputs.

use crate::baseline::RelaxationGraph;
use crate::config::DriverConfig;
use crate::error::ConfigError;
use crate::field::Field;
use crate::gapfill::{FillPlan, GapFiller};
use crate::record::OutputRecord;
use crate::series::SparseSeries;
use crate::sources::{self, RawReadings, SourceAdapter};
use crate::time::TimeRange;
use crate::window::SlidingWindow;
use log::debug;
use std::collections::BTreeMap;

/// Turns a window of raw source data into output records
pub struct WindowProcessor {
    graph: RelaxationGraph,
    filler: GapFiller,
    sources: Vec<Box<dyn SourceAdapter>>,
    averaging_minutes: usize,
}

impl WindowProcessor {
    /// Processor with the configured sources and built-in relaxation rules
    pub fn from_config(config: &DriverConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            RelaxationGraph::standard(&config.gapfill)?,
            GapFiller::new(config.gapfill.clone()),
            sources::for_config(&config.sources),
            config.sources.averaging_interval_minutes as usize,
        ))
    }

    pub fn new(
        graph: RelaxationGraph,
        filler: GapFiller,
        sources: Vec<Box<dyn SourceAdapter>>,
        averaging_minutes: usize,
    ) -> Self {
        Self {
            graph,
            filler,
            sources,
            averaging_minutes,
        }
    }

    pub fn sources(&self) -> &[Box<dyn SourceAdapter>] {
        &self.sources
    }

    pub fn graph(&self) -> &RelaxationGraph {
        &self.graph
    }

    /// Range each field must be resolved over
    fn resolution_ranges(&self, window: &SlidingWindow) -> BTreeMap<Field, TimeRange> {
        let mut ranges = BTreeMap::new();
        for field in self.graph.order().iter().rev() {
            let range = self
                .graph
                .dependents(*field)
                .iter()
                .filter_map(|d| ranges.get(d))
                .fold(window.group_range(field.group()), |acc: TimeRange, r| {
                    acc.union(r)
                });
            ranges.insert(*field, range);
        }
        ranges
    }

    /// Dense values of every field over its resolution range
    pub fn resolve(&self, window: &SlidingWindow) -> BTreeMap<Field, SparseSeries> {
        let readings: Vec<RawReadings> = self.sources.iter().map(|s| s.read(window)).collect();
        let ranges = self.resolution_ranges(window);
        let empty = SparseSeries::new();
        let mut resolved: BTreeMap<Field, SparseSeries> = BTreeMap::new();

        for field in self.graph.order() {
            let target = ranges
                .get(field)
                .copied()
                .unwrap_or_else(|| window.output_range());

            let dense = if field.is_primary() {
                let source = readings.iter().find(|r| r.field(*field).is_some());
                let raw = source.and_then(|r| r.field(*field)).unwrap_or(&empty);
                let plan = FillPlan {
                    domain: source
                        .map(|r| r.domain)
                        .unwrap_or_else(|| TimeRange::with_length(target.start, 0)),
                    cutoff: source.map(|r| r.cutoff).unwrap_or(true),
                    target,
                };
                let filled = self
                    .filler
                    .densify(raw, &plan, |t| self.graph.baseline(*field, t, &resolved, raw));
                if field.is_averaged() {
                    filled.running_average(self.averaging_minutes)
                } else {
                    filled
                }
            } else {
                target
                    .iter()
                    .map(|t| (t, self.graph.baseline(*field, t, &resolved, &empty)))
                    .collect()
            };

            debug!("Resolved {} over {} minutes", field, dense.len());
            resolved.insert(*field, dense);
        }
        resolved
    }

    /// Records for the window's output range
    pub fn process(&self, window: &SlidingWindow) -> Vec<OutputRecord> {
        let resolved = self.resolve(window);
        window
            .output_range()
            .iter()
            .map(|t| {
                let values = Field::ALL
                    .iter()
                    .map(|field| {
                        let value = resolved
                            .get(field)
                            .and_then(|s| s.get(t))
                            .unwrap_or_else(|| {
                                self.graph.baseline(*field, t, &resolved, &SparseSeries::new())
                            });
                        (*field, value)
                    })
                    .collect();
                OutputRecord::new(t, values)
            })
            .collect()
    }
}
