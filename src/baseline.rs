// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Relaxation dependency graph
//!
//! Several baselines are functions of other fields at the same minute (Bz
//! relaxes toward a function of Kp and F10.7, the power indices follow the
//! hemispheric power, and so on). The graph orders fields so that every
//! field is resolved after the fields its baseline reads. The order is
//! computed once, with Kahn's algorithm, and a cycle is a configuration error.

use crate::config::GapFillConfig;
use crate::derived;
use crate::error::ConfigError;
use crate::field::{Field, Relaxation};
use crate::series::SparseSeries;
use crate::time::TimePoint;
use std::collections::{BTreeMap, VecDeque};

/// Fields, their relaxation rules and a resolution order
#[derive(Debug, Clone)]
pub struct RelaxationGraph {
    rules: BTreeMap<Field, Relaxation>,
    order: Vec<Field>,
}

impl RelaxationGraph {
    /// Build from explicit rules
    pub fn new(rules: BTreeMap<Field, Relaxation>) -> Result<Self, ConfigError> {
        for (field, rule) in &rules {
            if let Some(input) = rule.inputs().iter().find(|i| !rules.contains_key(*i)) {
                return Err(ConfigError::InvalidValue {
                    name: "relaxation",
                    reason: format!("{} reads {} which has no rule", field, input),
                });
            }
        }

        let mut indegree: BTreeMap<Field, usize> = rules
            .iter()
            .map(|(field, rule)| (*field, rule.inputs().len()))
            .collect();
        let mut queue: VecDeque<Field> = indegree
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(f, _)| *f)
            .collect();
        let mut order = Vec::with_capacity(rules.len());

        while let Some(field) = queue.pop_front() {
            order.push(field);
            for (dependent, rule) in &rules {
                let edges = rule.inputs().iter().filter(|i| **i == field).count();
                if edges == 0 {
                    continue;
                }
                if let Some(n) = indegree.get_mut(dependent) {
                    *n -= edges;
                    if *n == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        if order.len() < rules.len() {
            let stuck: Vec<&str> = indegree
                .iter()
                .filter(|(_, n)| **n > 0)
                .map(|(f, _)| f.name())
                .collect();
            return Err(ConfigError::DependencyCycle(stuck.join(", ")));
        }

        Ok(Self { rules, order })
    }

    /// Built-in rules for every field
    pub fn standard(config: &GapFillConfig) -> Result<Self, ConfigError> {
        let mut rules: BTreeMap<Field, Relaxation> = Field::ALL
            .iter()
            .map(|f| (*f, f.default_relaxation()))
            .collect();
        if config.flux_average_self_mean {
            rules.insert(
                Field::F107Avg,
                Relaxation::SelfMean {
                    fallback: derived::F107_MIN,
                },
            );
        }
        Self::new(rules)
    }

    /// Fields in resolution order: inputs before dependents
    pub fn order(&self) -> &[Field] {
        &self.order
    }

    pub fn rule(&self, field: Field) -> Option<&Relaxation> {
        self.rules.get(&field)
    }

    /// Fields whose baseline reads `field` directly
    pub fn dependents(&self, field: Field) -> Vec<Field> {
        self.rules
            .iter()
            .filter(|(_, rule)| rule.inputs().contains(&field))
            .map(|(f, _)| *f)
            .collect()
    }

    /// Relaxation target of `field` at `t`
    ///
    /// `resolved` holds the already-densified series of earlier fields in
    /// [`order`](Self::order); `own` is the field's raw readings, used by
    /// [`Relaxation::SelfMean`].
    pub fn baseline(
        &self,
        field: Field,
        t: TimePoint,
        resolved: &BTreeMap<Field, SparseSeries>,
        own: &SparseSeries,
    ) -> f64 {
        match self.rules.get(&field) {
            Some(Relaxation::Constant(value)) => *value,
            Some(Relaxation::SelfMean { fallback }) => own.mean().unwrap_or(*fallback),
            Some(Relaxation::Derived { inputs, formula }) => {
                let values: Vec<f64> = inputs
                    .iter()
                    .map(|input| {
                        resolved
                            .get(input)
                            .and_then(|s| s.get(t))
                            .unwrap_or_else(|| {
                                // The graph is acyclic, so this terminates.
                                self.baseline(*input, t, resolved, &SparseSeries::new())
                            })
                    })
                    .collect();
                formula(&values)
            }
            None => f64::NAN,
        }
    }
}
