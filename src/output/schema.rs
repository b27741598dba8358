// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Column and variable layout of the output formats

use crate::field::Field;
use crate::record::OutputRecord;
use crate::time::WAM_INPUT_FMT;

/// Width of the timestamp column
pub const TIME_WIDTH: usize = 20;

/// Width of every other column
pub const COLUMN_WIDTH: usize = 12;

/// Digits after the decimal point
pub const PRECISION: usize = 7;

/// What a text column shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Time,
    Value(Field),
    Index(Field),
    F107Flag,
    KpFlag,
}

/// Text table columns, in order
pub const TEXT_COLUMNS: [(&str, Column); 16] = [
    ("Date_Time", Column::Time),
    ("F10", Column::Value(Field::F107)),
    ("Kp", Column::Value(Field::Kp)),
    ("F10Flag", Column::F107Flag),
    ("KpFlag", Column::KpFlag),
    ("F10_41dAvg", Column::Value(Field::F107Avg)),
    ("24HrKpAvg", Column::Value(Field::KpAvg)),
    ("NHemiPow", Column::Value(Field::HemiPowerNorth)),
    ("NHemiPowIdx", Column::Index(Field::HemiPowerIndexNorth)),
    ("SHemiPow", Column::Value(Field::HemiPowerSouth)),
    ("SHemiPowIdx", Column::Index(Field::HemiPowerIndexSouth)),
    ("SW_Bt", Column::Value(Field::SwBt)),
    ("SW_Angle", Column::Value(Field::SwAngle)),
    ("SW_Velocity", Column::Value(Field::SwVelocity)),
    ("SW_Bz", Column::Value(Field::SwBz)),
    ("SW_Den", Column::Value(Field::SwDensity)),
];

/// Length of the dashed rule under the column names
pub const RULE_WIDTH: usize = COLUMN_WIDTH * TEXT_COLUMNS.len() + 8;

/// Variables of the binary output, in definition order
pub const NETCDF_VARIABLES: [Field; 16] = [
    Field::Kp,
    Field::KpAvg,
    Field::F107,
    Field::F107Avg,
    Field::HemiPowerNorth,
    Field::HemiPowerIndexNorth,
    Field::HemiPowerSouth,
    Field::HemiPowerIndexSouth,
    Field::SwBt,
    Field::SwAngle,
    Field::SwVelocity,
    Field::SwBz,
    Field::SwBy,
    Field::SwDensity,
    Field::Ap,
    Field::ApAvg,
];

/// Column-name line
pub fn header_line() -> String {
    let mut line = String::with_capacity(RULE_WIDTH);
    for (name, column) in TEXT_COLUMNS {
        match column {
            Column::Time => line.push_str(&format!("{:<w$}", name, w = TIME_WIDTH)),
            _ => line.push_str(&format!("{:>w$}", name, w = COLUMN_WIDTH)),
        }
    }
    line
}

/// One data line, without the newline
pub fn row_line(record: &OutputRecord) -> String {
    let mut line = String::with_capacity(RULE_WIDTH);
    for (_, column) in TEXT_COLUMNS {
        let cell = match column {
            Column::Time => format!(
                "{:<w$}",
                record.time.format(WAM_INPUT_FMT),
                w = TIME_WIDTH
            ),
            Column::Value(field) => format!(
                "{:>w$.p$}",
                record.get(field),
                w = COLUMN_WIDTH,
                p = PRECISION
            ),
            Column::Index(field) => format!("{:>w$}", record.index(field), w = COLUMN_WIDTH),
            Column::F107Flag => format!("{:>w$}", record.f107_flag, w = COLUMN_WIDTH),
            Column::KpFlag => format!("{:>w$}", record.kp_flag, w = COLUMN_WIDTH),
        };
        line.push_str(&cell);
    }
    line
}
