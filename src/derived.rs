// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Derived physical quantities
//!
//! Pure O(1) functions evaluated per minute. The velocity, power and
//! solar-wind electric field polynomials are empirical Kp fits.

/// Floor and relaxation value for F10.7 and its average (sfu)
pub const F107_MIN: f64 = 75.0;

/// Relaxation value for Kp and its 24-hour average
pub const KP_RELAX: f64 = 2.0;

/// Upper cap applied to bulletin Kp values
pub const KP_MAX: f64 = 999.0;

/// Relaxation value for solar-wind density (cm^-3)
pub const SW_DENSITY_RELAX: f64 = 5.0;

/// Relaxation value for solar-wind Bx and By (nT)
pub const SW_TRANSVERSE_RELAX: f64 = 0.0;

/// Upper bounds (GW) of hemispheric power index classes 1 to 9
pub const POWER_INDEX_THRESHOLDS: [f64; 9] =
    [2.5, 3.94, 6.22, 9.82, 15.49, 24.44, 38.56, 60.85, 96.0];


/// Ap for Kp = 0, 1/3, 2/3, ... 9
const AP_TABLE: [f64; 28] = [
    0.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0, 12.0, 15.0, 18.0, 22.0, 27.0, 32.0, 39.0, 48.0, 56.0,
    67.0, 80.0, 94.0, 111.0, 132.0, 154.0, 179.0, 207.0, 236.0, 300.0, 400.0,
];

/// Interplanetary field magnitude from its three components
pub fn field_magnitude(bx: f64, by: f64, bz: f64) -> f64 {
    (bx * bx + by * by + bz * bz).sqrt()
}

/// Clock angle in degrees, normalized to [0, 360)
pub fn field_angle(by: f64, bz: f64) -> f64 {
    let angle = by.atan2(bz).to_degrees();
    if angle < 0.0 {
        angle + 360.0
    } else {
        angle
    }
}

/// Solar-wind speed (km/s) from Kp
pub fn solar_wind_velocity(kp: f64) -> f64 {
    317.0 + 55.84 * kp - 2.71 * kp.powi(2)
}

/// Hemispheric power (GW) from Kp
pub fn hemispheric_power(kp: f64) -> f64 {
    1.29 + 15.60 * kp - 4.93 * kp.powi(2) + 0.64 * kp.powi(3)
}

/// Discrete power class 1..=10; a value exactly on a threshold stays in the lower class
pub fn power_index(gw: f64) -> u8 {
    POWER_INDEX_THRESHOLDS
        .iter()
        .position(|&upper| gw <= upper)
        .map(|i| i as u8 + 1)
        .unwrap_or(10)
}

/// Median solar-wind electric field (mV/m) from Kp
pub fn solar_wind_efield(kp: f64) -> f64 {
    0.1455 + 0.4675 * kp - 0.1446 * kp.powi(2) + 0.0276 * kp.powi(3)
}

/// Default Bz (nT) when no solar-wind observation exists
///
/// Southward field that carries the median electric field at the
/// Kp-derived speed: `-E * 1000 / v`.
pub fn bz_relaxation(kp: f64) -> f64 {
    -solar_wind_efield(kp) * 1000.0 / solar_wind_velocity(kp)
}

/// Linearized Ap from Kp
pub fn kp_to_ap(kp: f64) -> f64 {
    if !kp.is_finite() || kp <= 0.0 {
        return 0.0;
    }
    let position = kp * 3.0;
    let last = AP_TABLE.len() - 1;
    if position >= last as f64 {
        return AP_TABLE[last];
    }
    let lower = position.floor() as usize;
    let frac = position - lower as f64;
    AP_TABLE[lower] + frac * (AP_TABLE[lower + 1] - AP_TABLE[lower])
}
