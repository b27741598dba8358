// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Kp / F10.7 bulletin reader
//!
//! Bulletins live at `{root}/*/swpc/wam/wam_input*`. Each is an XML document
//! of `data-item` elements tagged with `time-tag` and carrying `kp`,
//! `kp-24-hr-avg`, `f10` and `f10-41-avg`. The newest bulletin issued no later
//! than the window start is used; it covers seven days from its first time tag.

use super::{find_dated_files, parse_number, RawReadings, SourceAdapter};
use crate::config::SourceConfig;
use crate::derived::{F107_MIN, KP_MAX};
use crate::error::SourceError;
use crate::field::{Field, FieldGroup};
use crate::time::{TimePoint, TimeRange};
use crate::window::SlidingWindow;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

const SUBDIR: &str = "swpc/wam";
const PREFIX: &str = "wam_input";

/// Child element and field, in document order
const CHILDREN: [(&str, Field); 4] = [
    ("kp", Field::Kp),
    ("kp-24-hr-avg", Field::KpAvg),
    ("f10", Field::F107),
    ("f10-41-avg", Field::F107Avg),
];

/// One parsed bulletin
#[derive(Debug, Clone, PartialEq)]
pub struct Bulletin {
    /// First time tag in the document
    pub issue: TimePoint,
    /// Entries in `CHILDREN` order, already capped and floored; `None` marks
    /// a missing or malformed child
    pub entries: Vec<(TimePoint, [Option<f64>; 4])>,
}

impl Bulletin {
    /// Parse a bulletin document
    ///
    /// A missing or malformed child leaves only that value absent. Entries
    /// without a readable time tag or any value are dropped; a document
    /// without a readable first time tag is an error.
    pub fn parse(text: &str, path: &Path) -> Result<Self, SourceError> {
        let doc = roxmltree::Document::parse(text).map_err(|e| SourceError::Xml {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let items: Vec<_> = doc
            .root_element()
            .children()
            .filter(|n| n.has_tag_name("data-item"))
            .collect();

        let first = items.first().ok_or_else(|| SourceError::Missing {
            what: "data-item".to_string(),
            path: path.display().to_string(),
        })?;
        let issue = parse_time_tag(first.attribute("time-tag"), path)?;

        let mut entries = Vec::with_capacity(items.len());
        for item in &items {
            match parse_entry(item, path) {
                Ok((_, values)) if values.iter().all(Option::is_none) => {}
                Ok(entry) => entries.push(entry),
                Err(e) => debug!("Dropping bulletin entry: {}", e),
            }
        }
        Ok(Self { issue, entries })
    }
}

fn parse_time_tag(tag: Option<&str>, path: &Path) -> Result<TimePoint, SourceError> {
    let tag = tag.ok_or_else(|| SourceError::Missing {
        what: "time-tag".to_string(),
        path: path.display().to_string(),
    })?;
    TimePoint::parse_iso(tag).map_err(|_| SourceError::Malformed {
        value: tag.to_string(),
        path: path.display().to_string(),
    })
}

fn parse_entry(
    item: &roxmltree::Node<'_, '_>,
    path: &Path,
) -> Result<(TimePoint, [Option<f64>; 4]), SourceError> {
    let t = parse_time_tag(item.attribute("time-tag"), path)?;
    let mut values = [None; 4];
    for (slot, (tag, field)) in values.iter_mut().zip(CHILDREN) {
        let text = item
            .children()
            .find(|c| c.has_tag_name(tag))
            .and_then(|c| c.text());
        match parse_number(text, tag, path) {
            Ok(value) => {
                *slot = Some(match field {
                    Field::Kp | Field::KpAvg => value.min(KP_MAX),
                    _ => value.max(F107_MIN),
                })
            }
            Err(e) => debug!("{} at {}", e, t),
        }
    }
    Ok((t, values))
}

/// Periodic Kp and F10.7 bulletin
#[derive(Debug, Clone)]
pub struct BulletinSource {
    root: PathBuf,
    coverage_minutes: u32,
}

impl BulletinSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            root: config.root.clone(),
            coverage_minutes: config.bulletin_coverage_minutes,
        }
    }

    /// Candidate files, newest first
    fn candidates(&self) -> Vec<PathBuf> {
        let mut files = find_dated_files(&self.root, SUBDIR, PREFIX);
        files.reverse();
        files
    }

    fn load(path: &Path) -> Result<Bulletin, SourceError> {
        let text = fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        Bulletin::parse(&text, path)
    }

    /// Newest bulletin issued no later than `start`
    pub fn select(&self, start: TimePoint) -> Option<(PathBuf, Bulletin)> {
        for path in self.candidates() {
            match Self::load(&path) {
                Ok(bulletin) if bulletin.issue <= start => return Some((path, bulletin)),
                Ok(bulletin) => debug!(
                    "Skipping {}: issued {} after {}",
                    path.display(),
                    bulletin.issue,
                    start
                ),
                Err(e) => debug!("Skipping bulletin: {}", e),
            }
        }
        None
    }
}

impl SourceAdapter for BulletinSource {
    fn name(&self) -> &'static str {
        "bulletin"
    }

    fn group(&self) -> FieldGroup {
        FieldGroup::Bulletin
    }

    /// Bulletins are forecasts; the driver never waits for them
    fn is_polled(&self) -> bool {
        false
    }

    fn latest_available(&self) -> Option<TimePoint> {
        self.candidates()
            .iter()
            .find_map(|p| Self::load(p).ok())
            .and_then(|b| b.entries.last().map(|(t, _)| *t))
    }

    fn read(&self, window: &SlidingWindow) -> RawReadings {
        let output = window.output_range();
        let Some((path, bulletin)) = self.select(output.start) else {
            warn!(
                "No valid wam_input file found under {}, using baselines",
                self.root.display()
            );
            return RawReadings::empty(TimeRange::with_length(output.start, 0), false);
        };

        let domain = TimeRange::with_length(bulletin.issue, self.coverage_minutes);
        if domain.end < output.end {
            warn!(
                "Bulletin {} covers the window start but not its end ({} < {})",
                path.display(),
                domain.end,
                output.end
            );
        }

        let mut readings = RawReadings::empty(domain, false);
        for (t, values) in &bulletin.entries {
            if !domain.contains(*t) {
                continue;
            }
            for ((_, field), value) in CHILDREN.iter().zip(values) {
                if let Some(value) = value {
                    readings.insert(*field, *t, *value);
                }
            }
        }
        debug!(
            "Read {} bulletin values from {}",
            readings.count(),
            path.display()
        );
        readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn document(items: &[(&str, f64, f64, f64, f64)]) -> String {
        let mut xml = String::from("<wam-input>\n");
        for (tag, kp, kpa, f10, f10a) in items {
            xml.push_str(&format!(
                "  <data-item time-tag=\"{tag}\"><kp>{kp}</kp><kp-24-hr-avg>{kpa}</kp-24-hr-avg>\
                 <f10>{f10}</f10><f10-41-avg>{f10a}</f10-41-avg></data-item>\n"
            ));
        }
        xml.push_str("</wam-input>\n");
        xml
    }

    fn write(root: &Path, day: &str, name: &str, text: &str) {
        let dir = root.join(day).join(SUBDIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), text).unwrap();
    }

    fn tp(s: &str) -> TimePoint {
        TimePoint::parse_compact(s).unwrap()
    }

    #[test]
    fn test_parse_caps_and_floors() {
        let text = document(&[
            ("2021-02-17T00:00:00Z", 1200.0, 3.0, 60.0, 90.0),
            ("2021-02-17T03:00:00Z", 4.0, 3.0, 80.0, 90.0),
        ]);
        let b = Bulletin::parse(&text, Path::new("b.xml")).unwrap();
        assert_eq!(b.issue, tp("202102170000"));
        assert_eq!(b.entries[0].1, [Some(999.0), Some(3.0), Some(75.0), Some(90.0)]);
        assert_eq!(b.entries[1].1, [Some(4.0), Some(3.0), Some(80.0), Some(90.0)]);
    }

    #[test]
    fn test_parse_keeps_fields_of_incomplete_entries() {
        let text = "<wam-input>\
            <data-item time-tag=\"2021-02-17T00:00:00Z\"><kp>1</kp><kp-24-hr-avg>1</kp-24-hr-avg>\
            <f10>100</f10><f10-41-avg>100</f10-41-avg></data-item>\
            <data-item time-tag=\"2021-02-17T03:00:00Z\"><kp>7</kp><kp-24-hr-avg>5</kp-24-hr-avg>\
            <f10>120</f10></data-item>\
            <data-item time-tag=\"2021-02-17T06:00:00Z\"><kp>x</kp><kp-24-hr-avg>1</kp-24-hr-avg>\
            <f10>100</f10><f10-41-avg>100</f10-41-avg></data-item>\
            <data-item time-tag=\"2021-02-17T09:00:00Z\"></data-item>\
            <data-item time-tag=\"bad\"><kp>1</kp></data-item></wam-input>";
        let b = Bulletin::parse(text, Path::new("b.xml")).unwrap();
        assert_eq!(b.issue, tp("202102170000"));
        assert_eq!(b.entries.len(), 3);
        assert_eq!(b.entries[1].0, tp("202102170300"));
        assert_eq!(b.entries[1].1, [Some(7.0), Some(5.0), Some(120.0), None]);
        assert_eq!(b.entries[2].1, [None, Some(1.0), Some(100.0), Some(100.0)]);
    }

    #[test]
    fn test_read_keeps_storm_kp_without_flux_average() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "20210217",
            "wam_input_20210217.xml",
            "<wam-input>\
             <data-item time-tag=\"2021-02-17T00:00:00Z\"><kp>1</kp><kp-24-hr-avg>1</kp-24-hr-avg>\
             <f10>100</f10><f10-41-avg>100</f10-41-avg></data-item>\
             <data-item time-tag=\"2021-02-17T03:00:00Z\"><kp>7</kp><kp-24-hr-avg>5</kp-24-hr-avg>\
             <f10>120</f10></data-item></wam-input>",
        );
        let config = SourceConfig::with_root(dir.path());
        let window = SlidingWindow::new(tp("202102170100"), 15, &config);
        let readings = BulletinSource::new(&config).read(&window);

        assert_eq!(readings.field(Field::Kp).unwrap().get(tp("202102170300")), Some(7.0));
        assert_eq!(readings.field(Field::F107).unwrap().get(tp("202102170300")), Some(120.0));
        let avg = readings.field(Field::F107Avg).unwrap();
        assert_eq!(avg.len(), 1);
        assert_eq!(avg.get(tp("202102170300")), None);
    }

    #[test]
    fn test_parse_rejects_broken_xml() {
        assert!(matches!(
            Bulletin::parse("<wam-input>", Path::new("b.xml")),
            Err(SourceError::Xml { .. })
        ));
        assert!(matches!(
            Bulletin::parse("<wam-input/>", Path::new("b.xml")),
            Err(SourceError::Missing { .. })
        ));
    }

    #[test]
    fn test_selects_newest_issued_before_start() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "20210216",
            "wam_input_20210216.xml",
            &document(&[("2021-02-16T00:00:00Z", 1.0, 1.0, 80.0, 80.0)]),
        );
        write(
            dir.path(),
            "20210217",
            "wam_input_20210217.xml",
            &document(&[("2021-02-17T00:00:00Z", 5.0, 5.0, 90.0, 90.0)]),
        );
        write(
            dir.path(),
            "20210218",
            "wam_input_20210218.xml",
            &document(&[("2021-02-18T00:00:00Z", 7.0, 7.0, 95.0, 95.0)]),
        );
        write(dir.path(), "20210219", "wam_input_broken.xml", "<oops");

        let source = BulletinSource::new(&SourceConfig::with_root(dir.path()));
        let (path, b) = source.select(tp("202102171200")).unwrap();
        assert!(path.to_string_lossy().contains("20210217"));
        assert_eq!(b.issue, tp("202102170000"));
        assert_eq!(source.latest_available(), Some(tp("202102180000")));
    }

    #[test]
    fn test_read_restricts_to_coverage() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "20210217",
            "wam_input_20210217.xml",
            &document(&[
                ("2021-02-17T00:00:00Z", 3.0, 2.0, 80.0, 85.0),
                ("2021-02-17T03:00:00Z", 4.0, 2.5, 81.0, 85.0),
                ("2021-03-01T00:00:00Z", 9.0, 9.0, 200.0, 200.0),
            ]),
        );
        let config = SourceConfig::with_root(dir.path());
        let source = BulletinSource::new(&config);
        let window = SlidingWindow::new(tp("202102170100"), 15, &config);
        let readings = source.read(&window);

        assert_eq!(readings.domain.start, tp("202102170000"));
        assert_eq!(readings.domain.len(), 7 * 24 * 60 + 1);
        assert!(!readings.cutoff);
        let kp = readings.field(Field::Kp).unwrap();
        assert_eq!(kp.len(), 2);
        assert_eq!(kp.get(tp("202102170300")), Some(4.0));
    }

    #[test]
    fn test_read_without_bulletin_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = SourceConfig::with_root(dir.path());
        let window = SlidingWindow::new(tp("202102170100"), 15, &config);
        let readings = BulletinSource::new(&config).read(&window);
        assert_eq!(readings.count(), 0);
        assert!(readings.domain.is_empty());
    }
}
