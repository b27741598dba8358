// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fixed-width text table
//!
//! ```text
//! Issue Date          2021-02-17T00:15:00Z
//! Flags:  0=Forecast, 1=Estimated, 2=Observed
//!
//! Date_Time                    F10          Kp ...
//! ------------------------------------------ ...
//! 2021-02-17T00:15:00Z  75.0000000   2.0000000 ...
//! ```
//!
//! Row byte offsets are cached after the first scan so appends and
//! truncations never reread the file.

use super::schema::{header_line, row_line, RULE_WIDTH, TIME_WIDTH};
use super::OutputStore;
use crate::error::StoreError;
use crate::record::OutputRecord;
use crate::time::TimePoint;
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Text output file
#[derive(Debug)]
pub struct TextStore {
    path: PathBuf,
    issue: TimePoint,
    /// Byte offset of the first row
    header_end: u64,
    /// Byte offset just past each complete row
    row_ends: Vec<u64>,
    first: Option<TimePoint>,
}

impl TextStore {
    /// Store at `path`; nothing touches the disk until [`prepare`](OutputStore::prepare)
    pub fn new(path: impl AsRef<Path>, issue: TimePoint) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            issue,
            header_end: 0,
            row_ends: Vec::new(),
            first: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header block, ending with the dashed rule
    pub fn header(&self) -> String {
        format!(
            "Issue Date          {}\nFlags:  0=Forecast, 1=Estimated, 2=Observed \n\n{}\n{}\n",
            self.issue.to_iso(),
            header_line(),
            "-".repeat(RULE_WIDTH)
        )
    }

    fn create(&mut self) -> Result<(), StoreError> {
        let header = self.header();
        fs::write(&self.path, &header).map_err(|e| StoreError::io(&self.path, e))?;
        self.header_end = header.len() as u64;
        self.row_ends.clear();
        self.first = None;
        Ok(())
    }

    /// Rebuild the cached layout from the file
    fn scan(&mut self) -> Result<(), StoreError> {
        let text = fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;

        let mut offset = 0u64;
        let mut header_end = None;
        let mut lines = Vec::new();
        for line in text.split_inclusive('\n') {
            offset += line.len() as u64;
            let body = line.trim_end();
            if header_end.is_none() && !body.is_empty() && body.chars().all(|c| c == '-') {
                header_end = Some(offset);
                lines.clear();
                continue;
            }
            lines.push((line, offset));
        }

        // Without a rule the file holds rows only
        self.header_end = header_end.unwrap_or(0);
        self.row_ends = lines
            .iter()
            .filter(|(line, _)| line.ends_with('\n') && !line.trim().is_empty())
            .map(|(_, end)| *end)
            .collect();
        if lines.last().is_some_and(|(line, _)| !line.ends_with('\n')) {
            warn!("{}: ignoring incomplete last row", self.path.display());
        }

        self.first = match lines.iter().find(|(line, _)| !line.trim().is_empty()) {
            Some((line, _)) if !self.row_ends.is_empty() => {
                let stamp: String = line.chars().take(TIME_WIDTH).collect();
                Some(TimePoint::parse_iso(&stamp).map_err(|_| StoreError::Corrupt {
                    path: self.path.display().to_string(),
                    reason: format!("unreadable row time '{}'", stamp.trim()),
                })?)
            }
            _ => None,
        };
        debug!(
            "{}: {} rows after a {} byte header",
            self.path.display(),
            self.row_ends.len(),
            self.header_end
        );
        Ok(())
    }

    fn open_for_write(&self) -> Result<File, StoreError> {
        OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))
    }

    fn append(&mut self, records: &[OutputRecord]) -> Result<(), StoreError> {
        let mut offset = self.row_ends.last().copied().unwrap_or(self.header_end);
        let mut buf = String::new();
        let mut ends = Vec::with_capacity(records.len());
        for record in records {
            let line = row_line(record);
            offset += line.len() as u64 + 1;
            ends.push(offset);
            buf.push_str(&line);
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(buf.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| StoreError::io(&self.path, e))?;

        if self.row_ends.is_empty() {
            self.first = records.first().map(|r| r.time);
        }
        self.row_ends.extend(ends);
        Ok(())
    }
}

impl OutputStore for TextStore {
    fn name(&self) -> &'static str {
        "text"
    }

    fn len(&self) -> usize {
        self.row_ends.len()
    }

    fn first_time(&self) -> Option<TimePoint> {
        self.first
    }

    fn prepare(&mut self, append: bool) -> Result<(), StoreError> {
        if append && self.path.exists() {
            self.scan()
        } else {
            self.create()
        }
    }

    fn write_at(&mut self, index: usize, records: &[OutputRecord]) -> Result<(), StoreError> {
        if index > self.len() {
            return Err(StoreError::NonContiguous {
                len: self.len(),
                index,
            });
        }
        let result = self.truncate(index).and_then(|_| self.append(records));
        if result.is_err() {
            // Resync with whatever reached the disk
            if let Err(e) = self.scan() {
                warn!("{}: rescan failed: {}", self.path.display(), e);
            }
        }
        result
    }

    fn truncate(&mut self, len: usize) -> Result<(), StoreError> {
        if len >= self.row_ends.len() {
            // Drop a trailing partial row, if any
            let end = self.row_ends.last().copied().unwrap_or(self.header_end);
            let actual = fs::metadata(&self.path)
                .map_err(|e| StoreError::io(&self.path, e))?
                .len();
            if actual != end {
                self.open_for_write()?
                    .set_len(end)
                    .map_err(|e| StoreError::io(&self.path, e))?;
            }
            return Ok(());
        }
        let end = match len {
            0 => self.header_end,
            n => self.row_ends[n - 1],
        };
        self.open_for_write()?
            .set_len(end)
            .map_err(|e| StoreError::io(&self.path, e))?;
        self.row_ends.truncate(len);
        if len == 0 {
            self.first = None;
        }
        Ok(())
    }
}
