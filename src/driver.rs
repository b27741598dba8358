// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Realtime polling driver
//!
//! ```text
//!   Waiting --ready or timed out--> Parsing --> Outputting --ok--> Advancing
//!      ^                                            |                 |
//!      +------------------failed (rolled back)------+                 |
//!      +-------------------------- more segments ---------------------+
//!                                                   end reached --> Done
//! ```
//!
//! A segment is either committed to every store or to none of them: on
//! failure the stores are truncated back to their pre-cycle lengths and the
//! same window is retried after one poll interval.

use crate::config::DriverConfig;
use crate::error::{Result, StoreError};
use crate::output::{self, OutputStore};
use crate::processor::WindowProcessor;
use crate::record::OutputRecord;
use crate::time::{TimePoint, LOCK_FMT};
use crate::window::SlidingWindow;
use log::{debug, error, info, warn};
use std::cell::Cell;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Driver loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Polling sources until the segment's data has arrived
    Waiting,
    /// Rebuilding the window from scratch
    Parsing,
    /// Committing the output range to every store
    Outputting,
    /// Signalling the committed segment and moving on
    Advancing,
    /// End date reached
    Done,
}

/// Wall-clock time and sleeping
pub trait Clock {
    fn now(&self) -> TimePoint;
    fn sleep(&self, duration: Duration);
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimePoint {
        TimePoint::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when slept on
///
/// Replays archived inputs without waiting and makes the stale-data timeout
/// deterministic.
#[derive(Debug)]
pub struct ManualClock {
    origin: TimePoint,
    elapsed_secs: Cell<u64>,
}

impl ManualClock {
    pub fn new(origin: TimePoint) -> Self {
        Self {
            origin,
            elapsed_secs: Cell::new(0),
        }
    }

    /// Total time spent sleeping
    pub fn slept(&self) -> Duration {
        Duration::from_secs(self.elapsed_secs.get())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimePoint {
        self.origin
            .plus_minutes((self.elapsed_secs.get() / 60) as i64)
    }

    fn sleep(&self, duration: Duration) {
        self.elapsed_secs
            .set(self.elapsed_secs.get() + duration.as_secs());
    }
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Availability polls that found data missing
    pub polls: u64,
    /// Segments processed without waiting for all sources
    pub forced: u64,
    /// Failed commits, each rolled back and retried
    pub failed_commits: u64,
    /// Segments committed to every store
    pub committed: u64,
}

/// The sliding-window driver
pub struct RealtimeDriver<C: Clock> {
    config: DriverConfig,
    processor: WindowProcessor,
    stores: Vec<Box<dyn OutputStore>>,
    clock: C,
    window: SlidingWindow,
    state: DriverState,
    pending: Vec<OutputRecord>,
    stats: DriverStats,
}

impl<C: Clock> RealtimeDriver<C> {
    /// Validate `config`, then open sources and stores
    pub fn from_config(config: DriverConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let processor = WindowProcessor::from_config(&config)?;
        let stores = output::open_stores(&config, clock.now())?;
        Ok(Self::new(config, processor, stores, clock))
    }

    /// Driver over prepared stores; resumes after their last rows
    pub fn new(
        config: DriverConfig,
        processor: WindowProcessor,
        stores: Vec<Box<dyn OutputStore>>,
        clock: C,
    ) -> Self {
        let start = if config.output.append {
            output::resume_start(&stores).unwrap_or(config.start)
        } else {
            config.start
        };
        if start != config.start {
            info!("Resuming at {} from existing output", start);
        }
        let window = SlidingWindow::new(start, config.segment_minutes, &config.sources);
        let state = if start >= config.end {
            DriverState::Done
        } else {
            DriverState::Waiting
        };
        Self {
            config,
            processor,
            stores,
            clock,
            window,
            state,
            pending: Vec::new(),
            stats: DriverStats::default(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    pub fn stores(&self) -> &[Box<dyn OutputStore>] {
        &self.stores
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    /// Earliest latest-available time over the polled sources
    ///
    /// `None` when any polled source has nothing at all.
    fn latest_available(&self) -> Option<TimePoint> {
        let mut latest: Option<TimePoint> = None;
        for source in self.processor.sources().iter().filter(|s| s.is_polled()) {
            let Some(t) = source.latest_available() else {
                debug!("{}: nothing available", source.name());
                return None;
            };
            latest = Some(latest.map_or(t, |l| l.min(t)));
        }
        latest
    }

    fn wait(&mut self) -> DriverState {
        let target = self.window.target_end();
        let polled = self.processor.sources().iter().any(|s| s.is_polled());
        if !self.config.wait_for_data
            || !polled
            || self.latest_available().is_some_and(|latest| latest >= target)
        {
            return DriverState::Parsing;
        }

        let overdue = self.clock.now().minutes_since(target);
        if overdue >= self.config.max_wait_minutes as i64 {
            if self.config.max_wait_minutes > 0 {
                warn!(
                    "Data for {} still incomplete after {} minutes, processing anyway",
                    target, overdue
                );
            }
            self.stats.forced += 1;
            return DriverState::Parsing;
        }

        self.stats.polls += 1;
        self.clock.sleep(self.poll_interval());
        DriverState::Waiting
    }

    fn parse(&mut self) -> DriverState {
        debug!(
            "Processing {} minutes from {}",
            self.window.segment_minutes(),
            self.window.start()
        );
        self.pending = self.processor.process(&self.window);
        DriverState::Outputting
    }

    fn output(&mut self) -> DriverState {
        let lengths: Vec<usize> = self.stores.iter().map(|s| s.len()).collect();
        match self.commit_all() {
            Ok(()) => DriverState::Advancing,
            Err(e) => {
                error!("Output for {} failed: {}", self.window.start(), e);
                self.rollback(&lengths);
                self.stats.failed_commits += 1;
                self.clock.sleep(self.poll_interval());
                DriverState::Waiting
            }
        }
    }

    fn commit_all(&mut self) -> std::result::Result<(), StoreError> {
        for store in self.stores.iter_mut() {
            store.commit(&self.pending)?;
        }
        Ok(())
    }

    fn rollback(&mut self, lengths: &[usize]) {
        for (store, len) in self.stores.iter_mut().zip(lengths) {
            if let Err(e) = store.truncate(*len) {
                warn!("Rollback of {} store failed: {}", store.name(), e);
            }
        }
    }

    fn advance(&mut self) -> DriverState {
        self.stats.committed += 1;
        self.pending.clear();
        info!("Committed segment starting {}", self.window.start());
        self.touch_lock(self.window.start());

        self.window.advance();
        if self.window.start() >= self.config.end {
            self.touch_lock(self.config.end);
            DriverState::Done
        } else {
            DriverState::Waiting
        }
    }

    fn touch_lock(&self, t: TimePoint) {
        if let Some(dir) = &self.config.output.lock_dir {
            let path = lock_path(dir, t);
            if let Err(e) = File::create(&path) {
                warn!("Cannot write lock marker {}: {}", path.display(), e);
            }
        }
    }

    /// Perform one state transition
    pub fn step(&mut self) -> DriverState {
        self.state = match self.state {
            DriverState::Waiting => self.wait(),
            DriverState::Parsing => self.parse(),
            DriverState::Outputting => self.output(),
            DriverState::Advancing => self.advance(),
            DriverState::Done => DriverState::Done,
        };
        self.state
    }

    /// Run until the end date
    pub fn run(&mut self) -> DriverStats {
        info!(
            "Driving {} to {} in {}-minute segments",
            self.window.start(),
            self.config.end,
            self.config.segment_minutes
        );
        while self.step() != DriverState::Done {}
        info!(
            "Done: {} segments, {} forced, {} failed commits",
            self.stats.committed, self.stats.forced, self.stats.failed_commits
        );
        self.stats
    }
}

/// Marker file signalling a committed segment
pub fn lock_path(dir: &Path, t: TimePoint) -> PathBuf {
    dir.join(format!("{}.lock", t.format(LOCK_FMT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::RelaxationGraph;
    use crate::config::GapFillConfig;
    use crate::field::FieldGroup;
    use crate::gapfill::GapFiller;
    use crate::output::testing::MemoryStore;
    use crate::sources::{RawReadings, SourceAdapter};
    use std::rc::Rc;

    /// Source whose availability the test controls
    struct Delayed {
        latest: Rc<Cell<Option<TimePoint>>>,
    }

    impl SourceAdapter for Delayed {
        fn name(&self) -> &'static str {
            "delayed"
        }

        fn group(&self) -> FieldGroup {
            FieldGroup::SolarWind
        }

        fn latest_available(&self) -> Option<TimePoint> {
            self.latest.get()
        }

        fn read(&self, window: &SlidingWindow) -> RawReadings {
            RawReadings::empty(window.group_range(FieldGroup::SolarWind), true)
        }
    }

    fn tp(s: &str) -> TimePoint {
        TimePoint::parse_compact(s).unwrap()
    }

    fn config() -> DriverConfig {
        DriverConfig {
            start: tp("202102170000"),
            end: tp("202102170100"),
            segment_minutes: 15,
            max_wait_minutes: 60,
            ..Default::default()
        }
    }

    fn processor(sources: Vec<Box<dyn SourceAdapter>>) -> WindowProcessor {
        let gapfill = GapFillConfig::default();
        WindowProcessor::new(
            RelaxationGraph::standard(&gapfill).unwrap(),
            GapFiller::new(gapfill),
            sources,
            20,
        )
    }

    #[test]
    fn test_runs_to_end_without_polled_sources() {
        let mut driver = RealtimeDriver::new(
            config(),
            processor(Vec::new()),
            vec![Box::new(MemoryStore::default())],
            ManualClock::new(tp("202102170000")),
        );
        let stats = driver.run();
        assert_eq!(stats.committed, 4);
        assert_eq!(stats.polls, 0);
        assert_eq!(driver.stores()[0].len(), 60);
        assert_eq!(driver.state(), DriverState::Done);
    }

    #[test]
    fn test_waits_for_data() {
        let latest = Rc::new(Cell::new(Some(tp("202102170010"))));
        let source = Delayed {
            latest: latest.clone(),
        };
        let mut driver = RealtimeDriver::new(
            config(),
            processor(vec![Box::new(source)]),
            vec![Box::new(MemoryStore::default())],
            ManualClock::new(tp("202102170000")),
        );

        assert_eq!(driver.step(), DriverState::Waiting);
        assert_eq!(driver.step(), DriverState::Waiting);
        assert_eq!(driver.clock().slept(), Duration::from_secs(120));

        latest.set(Some(tp("202102170015")));
        assert_eq!(driver.step(), DriverState::Parsing);
        assert_eq!(driver.step(), DriverState::Outputting);
        assert_eq!(driver.step(), DriverState::Advancing);
        assert_eq!(driver.step(), DriverState::Waiting);
        assert_eq!(driver.window().start(), tp("202102170015"));
        assert_eq!(driver.stats().polls, 2);
        assert_eq!(driver.stats().forced, 0);
    }

    #[test]
    fn test_max_wait_forces_processing() {
        let source = Delayed {
            latest: Rc::new(Cell::new(None)),
        };
        let mut driver = RealtimeDriver::new(
            config(),
            processor(vec![Box::new(source)]),
            vec![Box::new(MemoryStore::default())],
            ManualClock::new(tp("202102170000")),
        );
        // Target end is 00:15; forced once the clock reaches 01:15
        let mut polls = 0;
        while driver.step() == DriverState::Waiting {
            polls += 1;
        }
        assert_eq!(driver.state(), DriverState::Parsing);
        assert_eq!(polls, 75);
        assert_eq!(driver.stats().forced, 1);
    }

    #[test]
    fn test_failed_commit_is_rolled_back_and_retried() {
        let failing = MemoryStore {
            fail_writes: 1,
            partial: true,
            ..Default::default()
        };
        let mut driver = RealtimeDriver::new(
            config(),
            processor(Vec::new()),
            vec![Box::new(MemoryStore::default()), Box::new(failing)],
            ManualClock::new(tp("202102170000")),
        );

        assert_eq!(driver.step(), DriverState::Parsing);
        assert_eq!(driver.step(), DriverState::Outputting);
        assert_eq!(driver.step(), DriverState::Waiting);
        assert_eq!(driver.stores()[0].len(), 0);
        assert_eq!(driver.stores()[1].len(), 0);
        assert_eq!(driver.window().start(), tp("202102170000"));

        let stats = driver.run();
        assert_eq!(stats.failed_commits, 1);
        assert_eq!(stats.committed, 4);
        assert_eq!(driver.stores()[0].len(), 60);
        assert_eq!(driver.stores()[1].len(), 60);
    }

    #[test]
    fn test_resume_from_store_length() {
        let mut existing = MemoryStore::default();
        existing.rows = (0..30)
            .map(|i| OutputRecord::new(tp("202102170000").plus_minutes(i), Default::default()))
            .collect();

        let mut cfg = config();
        cfg.output.append = true;
        let driver = RealtimeDriver::new(
            cfg,
            processor(Vec::new()),
            vec![Box::new(existing)],
            ManualClock::new(tp("202102170000")),
        );
        assert_eq!(driver.window().start(), tp("202102170030"));
    }

    #[test]
    fn test_lock_markers() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cfg = config();
        cfg.end = tp("202102170030");
        cfg.output.lock_dir = Some(dir.path().to_path_buf());
        let mut driver = RealtimeDriver::new(
            cfg,
            processor(Vec::new()),
            vec![Box::new(MemoryStore::default())],
            ManualClock::new(tp("202102170000")),
        );
        driver.run();
        assert!(dir.path().join("20210217_000000.lock").exists());
        assert!(dir.path().join("20210217_001500.lock").exists());
        assert!(dir.path().join("20210217_003000.lock").exists());
    }
}
