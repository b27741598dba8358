// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Input-tree fixtures shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use wam_input::TimePoint;

pub fn tp(s: &str) -> TimePoint {
    TimePoint::parse_compact(s).unwrap()
}

/// Solar-wind children: bx, by, bz, speed, density
pub const QUIET_WIND: [(&str, f64); 5] = [
    ("mag_bx_gsm", 1.0),
    ("mag_by_gsm", 2.0),
    ("mag_bz_gsm", -3.0),
    ("proton_speed", 400.0),
    ("proton_density", 7.0),
];

/// One geospace file stamped `stamp`
pub fn write_geospace(root: &Path, stamp: TimePoint, children: &[(&str, f64)]) {
    let dir = root.join(stamp.format("%Y%m%d")).join("swpc");
    fs::create_dir_all(&dir).unwrap();
    let mut xml = format!(
        "<geospace-input>\n  <data-item time-tag=\"{}\">\n",
        stamp.to_iso()
    );
    for (tag, value) in children {
        xml.push_str(&format!("    <{tag}>{value}</{tag}>\n"));
    }
    xml.push_str("  </data-item>\n</geospace-input>\n");
    let name = format!("geospace_input-{}.xml", stamp.format("%Y%m%dT%H%M"));
    fs::write(dir.join(name), xml).unwrap();
}

/// Geospace files for every stamp in `[first, first + minutes)`
pub fn write_geospace_run(root: &Path, first: TimePoint, minutes: i64) {
    for i in 0..minutes {
        write_geospace(root, first.plus_minutes(i), &QUIET_WIND);
    }
}

/// Daily aurora-power table; rows are `(time, north, south)`
pub fn write_aurora(root: &Path, day: &str, rows: &[(TimePoint, f64, f64)]) {
    let dir = root.join(day).join("swpc/wam");
    fs::create_dir_all(&dir).unwrap();
    let mut text = String::from(
        "# Product: Hemispheric power\n# Units: GW\n# Date       Time  Satellite     Nrth   Sth\n",
    );
    for (t, north, south) in rows {
        text.push_str(&format!(
            "{}  NOAA-17  (N)  5  {:6.2}  {:6.2}\n",
            t.format("%Y-%m-%d %H:%M"),
            north,
            south
        ));
    }
    fs::write(dir.join(format!("swpc_aurora_power_{day}.txt")), text).unwrap();
}

/// Bulletin with entries `(time-tag, kp, kp average, f10.7, f10.7 average)`
pub fn write_bulletin(root: &Path, day: &str, items: &[(&str, f64, f64, f64, f64)]) {
    let dir = root.join(day).join("swpc/wam");
    fs::create_dir_all(&dir).unwrap();
    let mut xml = String::from("<wam-input>\n");
    for (tag, kp, kpa, f10, f10a) in items {
        xml.push_str(&format!(
            "  <data-item time-tag=\"{tag}\">\n    <kp>{kp}</kp>\n    \
             <kp-24-hr-avg>{kpa}</kp-24-hr-avg>\n    <f10>{f10}</f10>\n    \
             <f10-41-avg>{f10a}</f10-41-avg>\n  </data-item>\n"
        ));
    }
    xml.push_str("</wam-input>\n");
    fs::write(dir.join(format!("wam_input_{day}.xml")), xml).unwrap();
}

/// Whitespace-split data rows of a text output file
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let text = fs::read_to_string(path).unwrap();
    let mut lines = text.lines();
    for line in lines.by_ref() {
        if !line.is_empty() && line.chars().all(|c| c == '-') {
            break;
        }
    }
    lines
        .map(|l| l.split_whitespace().map(str::to_string).collect())
        .collect()
}

/// Text-output column positions after whitespace splitting
pub mod col {
    pub const TIME: usize = 0;
    pub const F107: usize = 1;
    pub const KP: usize = 2;
    pub const F107_FLAG: usize = 3;
    pub const KP_FLAG: usize = 4;
    pub const HP_NORTH: usize = 7;
    pub const HPI_NORTH: usize = 8;
    pub const HP_SOUTH: usize = 9;
    pub const HPI_SOUTH: usize = 10;
    pub const BT: usize = 11;
    pub const ANGLE: usize = 12;
    pub const VELOCITY: usize = 13;
    pub const BZ: usize = 14;
    pub const DENSITY: usize = 15;
}

pub fn value(row: &[String], column: usize) -> f64 {
    row[column].parse().unwrap()
}
