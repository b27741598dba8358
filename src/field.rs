// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! The fixed field set and its relaxation rules

use crate::derived;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One model driver quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Geomagnetic activity index
    Kp,
    /// 24-hour average of Kp
    KpAvg,
    /// Solar radio flux at 10.7 cm
    F107,
    /// 41-day running average of F10.7
    F107Avg,
    /// Solar-wind magnetic field, GSM x
    SwBx,
    /// Solar-wind magnetic field, GSM y (transverse)
    SwBy,
    /// Solar-wind magnetic field, GSM z (vertical)
    SwBz,
    /// Solar-wind proton speed
    SwVelocity,
    /// Solar-wind proton density
    SwDensity,
    /// Northern hemispheric power
    HemiPowerNorth,
    /// Southern hemispheric power
    HemiPowerSouth,
    /// Northern hemispheric power class
    HemiPowerIndexNorth,
    /// Southern hemispheric power class
    HemiPowerIndexSouth,
    /// Field magnitude
    SwBt,
    /// Field clock angle
    SwAngle,
    /// Ap from Kp
    Ap,
    /// Ap from the 24-hour Kp average
    ApAvg,
}

impl Field {
    /// Every field, in declaration order
    pub const ALL: [Field; 17] = [
        Field::Kp,
        Field::KpAvg,
        Field::F107,
        Field::F107Avg,
        Field::SwBx,
        Field::SwBy,
        Field::SwBz,
        Field::SwVelocity,
        Field::SwDensity,
        Field::HemiPowerNorth,
        Field::HemiPowerSouth,
        Field::HemiPowerIndexNorth,
        Field::HemiPowerIndexSouth,
        Field::SwBt,
        Field::SwAngle,
        Field::Ap,
        Field::ApAvg,
    ];

    /// Short variable name used in the binary output
    pub fn name(&self) -> &'static str {
        match self {
            Field::Kp => "kp",
            Field::KpAvg => "kpa",
            Field::F107 => "f107",
            Field::F107Avg => "f107d",
            Field::SwBx => "swbx",
            Field::SwBy => "swby",
            Field::SwBz => "swbz",
            Field::SwVelocity => "swvel",
            Field::SwDensity => "swden",
            Field::HemiPowerNorth => "hp_n",
            Field::HemiPowerSouth => "hp_s",
            Field::HemiPowerIndexNorth => "hpi_n",
            Field::HemiPowerIndexSouth => "hpi_s",
            Field::SwBt => "swbt",
            Field::SwAngle => "swang",
            Field::Ap => "ap",
            Field::ApAvg => "apa",
        }
    }

    /// Physical units, where meaningful
    pub fn units(&self) -> Option<&'static str> {
        match self {
            Field::F107 | Field::F107Avg => Some("sfu"),
            Field::SwBx | Field::SwBy | Field::SwBz | Field::SwBt => Some("nT"),
            Field::SwVelocity => Some("km/s"),
            Field::SwDensity => Some("cm^-3"),
            Field::HemiPowerNorth | Field::HemiPowerSouth => Some("GW"),
            Field::SwAngle => Some("degrees"),
            Field::Ap | Field::ApAvg => Some("nT"),
            _ => None,
        }
    }

    /// Source group that supplies the field
    pub fn group(&self) -> FieldGroup {
        match self {
            Field::Kp | Field::KpAvg | Field::F107 | Field::F107Avg => FieldGroup::Bulletin,
            Field::SwBx | Field::SwBy | Field::SwBz | Field::SwVelocity | Field::SwDensity => {
                FieldGroup::SolarWind
            }
            Field::HemiPowerNorth | Field::HemiPowerSouth => FieldGroup::AuroraPower,
            Field::HemiPowerIndexNorth
            | Field::HemiPowerIndexSouth
            | Field::SwBt
            | Field::SwAngle
            | Field::Ap
            | Field::ApAvg => FieldGroup::Derived,
        }
    }

    /// Whether the field is ever observed directly
    pub fn is_primary(&self) -> bool {
        self.group() != FieldGroup::Derived
    }

    /// Whether a causal running average is applied after gap filling
    pub fn is_averaged(&self) -> bool {
        self.group() == FieldGroup::SolarWind
    }

    /// Built-in relaxation rule
    pub fn default_relaxation(&self) -> Relaxation {
        match self {
            Field::Kp | Field::KpAvg => Relaxation::Constant(derived::KP_RELAX),
            Field::F107 | Field::F107Avg => Relaxation::Constant(derived::F107_MIN),
            Field::SwBx | Field::SwBy => Relaxation::Constant(derived::SW_TRANSVERSE_RELAX),
            Field::SwDensity => Relaxation::Constant(derived::SW_DENSITY_RELAX),
            Field::SwBz => Relaxation::Derived {
                inputs: &[Field::Kp],
                formula: |v| derived::bz_relaxation(v[0]),
            },
            Field::SwVelocity => Relaxation::Derived {
                inputs: &[Field::Kp],
                formula: |v| derived::solar_wind_velocity(v[0]),
            },
            Field::HemiPowerNorth | Field::HemiPowerSouth => Relaxation::Derived {
                inputs: &[Field::Kp],
                formula: |v| derived::hemispheric_power(v[0]),
            },
            Field::HemiPowerIndexNorth => Relaxation::Derived {
                inputs: &[Field::HemiPowerNorth],
                formula: |v| derived::power_index(v[0]) as f64,
            },
            Field::HemiPowerIndexSouth => Relaxation::Derived {
                inputs: &[Field::HemiPowerSouth],
                formula: |v| derived::power_index(v[0]) as f64,
            },
            Field::SwBt => Relaxation::Derived {
                inputs: &[Field::SwBx, Field::SwBy, Field::SwBz],
                formula: |v| derived::field_magnitude(v[0], v[1], v[2]),
            },
            Field::SwAngle => Relaxation::Derived {
                inputs: &[Field::SwBy, Field::SwBz],
                formula: |v| derived::field_angle(v[0], v[1]),
            },
            Field::Ap => Relaxation::Derived {
                inputs: &[Field::Kp],
                formula: |v| derived::kp_to_ap(v[0]),
            },
            Field::ApAvg => Relaxation::Derived {
                inputs: &[Field::KpAvg],
                formula: |v| derived::kp_to_ap(v[0]),
            },
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields that share a source and a lookback length
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldGroup {
    /// Kp and F10.7 from the periodic bulletin
    Bulletin,
    /// Per-minute L1 solar-wind measurements
    SolarWind,
    /// Daily hemispheric-power tables
    AuroraPower,
    /// Computed from other fields only
    Derived,
}

impl FieldGroup {
    /// Fields belonging to this group
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        Field::ALL.into_iter().filter(move |f| f.group() == *self)
    }
}

/// Fallback used for a field when no observation is close enough in time
#[derive(Clone, Copy)]
pub enum Relaxation {
    /// Fixed climatological value
    Constant(f64),
    /// Function of other fields at the same minute
    Derived {
        inputs: &'static [Field],
        formula: fn(&[f64]) -> f64,
    },
    /// Mean of the field's own observations, or `fallback` when there are none
    SelfMean { fallback: f64 },
}

impl fmt::Debug for Relaxation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relaxation::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Relaxation::Derived { inputs, .. } => f
                .debug_struct("Derived")
                .field("inputs", inputs)
                .finish_non_exhaustive(),
            Relaxation::SelfMean { fallback } => f
                .debug_struct("SelfMean")
                .field("fallback", fallback)
                .finish(),
        }
    }
}

impl Relaxation {
    /// Fields this rule reads
    pub fn inputs(&self) -> &'static [Field] {
        match self {
            Relaxation::Derived { inputs, .. } => inputs,
            _ => &[],
        }
    }
}
