// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! End-to-end runs of the realtime driver against temporary input trees

mod common;

use approx::assert_relative_eq;
use common::*;
use std::path::Path;
use tempfile::TempDir;
use wam_input::derived;
use wam_input::*;

fn config(root: &Path, out: &Path, start: &str, end: &str) -> DriverConfig {
    let mut config = DriverConfig {
        start: tp(start),
        end: tp(end),
        ..Default::default()
    };
    config.sources.root = root.to_path_buf();
    config.output.text_path = Some(out.join("wam_input_f107_kp.txt"));
    config
}

fn quiet_bulletin(root: &Path) {
    write_bulletin(
        root,
        "20210217",
        &[
            ("2021-02-17T00:00:00Z", 3.0, 2.0, 100.0, 90.0),
            ("2021-02-17T03:00:00Z", 3.0, 2.0, 100.0, 90.0),
        ],
    );
}

#[test]
fn test_derived_mode_from_bulletin() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    quiet_bulletin(input.path());

    let mut cfg = config(input.path(), out.path(), "202102170100", "202102170200");
    cfg.sources.mode = SourceMode::Derived;
    let text = cfg.output.text_path.clone().unwrap();

    let mut driver = RealtimeDriver::from_config(cfg, ManualClock::new(tp("202102170100"))).unwrap();
    let stats = driver.run();
    assert_eq!(stats.committed, 4);
    assert_eq!(stats.polls, 0);

    let rows = read_rows(&text);
    assert_eq!(rows.len(), 60);
    assert_eq!(rows[0][col::TIME], "2021-02-17T01:00:00Z");
    assert_eq!(rows[59][col::TIME], "2021-02-17T01:59:00Z");

    for row in &rows {
        assert_relative_eq!(value(row, col::KP), 3.0, epsilon = 1e-6);
        assert_relative_eq!(value(row, col::F107), 100.0, epsilon = 1e-6);
        assert_eq!(row[col::F107_FLAG], "2");
        assert_eq!(row[col::KP_FLAG], "1");
        assert_relative_eq!(
            value(row, col::VELOCITY),
            derived::solar_wind_velocity(3.0),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            value(row, col::BZ),
            derived::bz_relaxation(3.0),
            epsilon = 1e-6
        );
        assert_relative_eq!(value(row, col::ANGLE), 180.0, epsilon = 1e-6);
        assert_relative_eq!(
            value(row, col::HP_NORTH),
            derived::hemispheric_power(3.0),
            epsilon = 1e-6
        );
        assert_eq!(row[col::HPI_NORTH], "6");
        assert_relative_eq!(value(row, col::DENSITY), 5.0, epsilon = 1e-6);
    }
}

#[test]
fn test_observed_mode_with_data_on_time() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    quiet_bulletin(input.path());
    // Solar-wind range 23:47 to 01:15 from stamps 53 minutes earlier, plus one
    // more so the data time reaches the segment end
    write_geospace_run(input.path(), tp("202102162254"), 89);
    // Aurora range 23:50 to 01:15, from rows 50 minutes earlier
    let rows = |first: &str, n: i64| -> Vec<(TimePoint, f64, f64)> {
        (0..n).map(|i| (tp(first).plus_minutes(i), 10.0, 100.0)).collect()
    };
    write_aurora(input.path(), "20210216", &rows("202102162300", 60));
    write_aurora(input.path(), "20210217", &rows("202102170000", 26));

    let cfg = config(input.path(), out.path(), "202102170100", "202102170115");
    let text = cfg.output.text_path.clone().unwrap();
    let mut driver = RealtimeDriver::from_config(cfg, ManualClock::new(tp("202102170115"))).unwrap();
    let stats = driver.run();
    assert_eq!(stats.committed, 1);
    assert_eq!(stats.polls, 0);
    assert_eq!(stats.forced, 0);

    let rows = read_rows(&text);
    assert_eq!(rows.len(), 15);
    for row in &rows {
        assert_relative_eq!(value(row, col::BT), 14f64.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(
            value(row, col::ANGLE),
            derived::field_angle(2.0, -3.0),
            epsilon = 1e-6
        );
        assert_relative_eq!(value(row, col::VELOCITY), 400.0, epsilon = 1e-6);
        assert_relative_eq!(value(row, col::BZ), -3.0, epsilon = 1e-6);
        assert_relative_eq!(value(row, col::DENSITY), 7.0, epsilon = 1e-6);
        assert_relative_eq!(value(row, col::HP_NORTH), 10.0, epsilon = 1e-6);
        assert_eq!(row[col::HPI_NORTH], "5");
        assert_relative_eq!(value(row, col::HP_SOUTH), 100.0, epsilon = 1e-6);
        assert_eq!(row[col::HPI_SOUTH], "10");
    }
}

#[test]
fn test_observed_mode_without_data_is_forced() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut cfg = config(input.path(), out.path(), "202102170000", "202102170100");
    cfg.max_wait_minutes = 0;
    let text = cfg.output.text_path.clone().unwrap();

    let mut driver = RealtimeDriver::from_config(cfg, ManualClock::new(tp("202102170000"))).unwrap();
    let stats = driver.run();
    assert_eq!(stats.committed, 4);
    assert_eq!(stats.forced, 4);
    // The clock only reaches each segment's end by polling
    assert!(stats.polls >= 15);

    let rows = read_rows(&text);
    assert_eq!(rows.len(), 60);
    for row in &rows {
        assert_relative_eq!(value(row, col::KP), 2.0, epsilon = 1e-6);
        assert_relative_eq!(value(row, col::F107), 75.0, epsilon = 1e-6);
        assert_relative_eq!(
            value(row, col::VELOCITY),
            derived::solar_wind_velocity(2.0),
            epsilon = 1e-6
        );
        assert_relative_eq!(value(row, col::ANGLE), 180.0, epsilon = 1e-6);
        assert_relative_eq!(value(row, col::BZ), derived::bz_relaxation(2.0), epsilon = 1e-6);
        for (power, index) in [(col::HP_NORTH, col::HPI_NORTH), (col::HP_SOUTH, col::HPI_SOUTH)] {
            assert_relative_eq!(
                value(row, power),
                derived::hemispheric_power(2.0),
                epsilon = 1e-6
            );
            assert_eq!(row[index], "6");
        }
    }
}

#[test]
fn test_no_wait_skips_polling() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut cfg = config(input.path(), out.path(), "202102170000", "202102170100");
    cfg.wait_for_data = false;

    let mut driver = RealtimeDriver::from_config(cfg, ManualClock::new(tp("202102170000"))).unwrap();
    let stats = driver.run();
    assert_eq!(stats.committed, 4);
    assert_eq!(stats.polls, 0);
    assert_eq!(driver.clock().slept(), std::time::Duration::ZERO);
}

#[test]
fn test_append_resumes_after_last_row() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    quiet_bulletin(input.path());

    let mut first = config(input.path(), out.path(), "202102170100", "202102170130");
    first.sources.mode = SourceMode::Derived;
    let text = first.output.text_path.clone().unwrap();
    RealtimeDriver::from_config(first.clone(), ManualClock::new(tp("202102170100")))
        .unwrap()
        .run();
    assert_eq!(read_rows(&text).len(), 30);

    // Restarted with the original start; picks up where the file ends
    let mut second = first;
    second.end = tp("202102170200");
    second.output.append = true;
    let mut driver =
        RealtimeDriver::from_config(second, ManualClock::new(tp("202102170130"))).unwrap();
    assert_eq!(driver.window().start(), tp("202102170130"));
    assert_eq!(driver.run().committed, 2);

    let rows = read_rows(&text);
    assert_eq!(rows.len(), 60);
    for (i, row) in rows.iter().enumerate() {
        let expected = tp("202102170100").plus_minutes(i as i64);
        assert_eq!(row[col::TIME], expected.to_iso());
    }
}

#[test]
fn test_finished_output_is_left_alone() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut cfg = config(input.path(), out.path(), "202102170000", "202102170030");
    cfg.sources.mode = SourceMode::Derived;
    let text = cfg.output.text_path.clone().unwrap();
    RealtimeDriver::from_config(cfg.clone(), ManualClock::new(tp("202102170000")))
        .unwrap()
        .run();
    let before = std::fs::read_to_string(&text).unwrap();

    cfg.output.append = true;
    let mut driver = RealtimeDriver::from_config(cfg, ManualClock::new(tp("202102170000"))).unwrap();
    assert_eq!(driver.state(), DriverState::Done);
    assert_eq!(driver.run().committed, 0);
    assert_eq!(std::fs::read_to_string(&text).unwrap(), before);
}

#[test]
fn test_lock_markers_per_segment() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut cfg = config(input.path(), out.path(), "202102170000", "202102170045");
    cfg.sources.mode = SourceMode::Derived;
    cfg.output.lock_dir = Some(out.path().to_path_buf());

    RealtimeDriver::from_config(cfg, ManualClock::new(tp("202102170000")))
        .unwrap()
        .run();
    for stamp in ["000000", "001500", "003000", "004500"] {
        let marker = out.path().join(format!("20210217_{stamp}.lock"));
        assert!(marker.exists(), "missing {}", marker.display());
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let cfg = config(input.path(), out.path(), "202102170015", "202006010559");
    let result = RealtimeDriver::from_config(cfg, ManualClock::new(tp("202102170015")));
    assert!(matches!(
        result,
        Err(WamError::Config(ConfigError::StartNotBeforeEnd { .. }))
    ));
}
