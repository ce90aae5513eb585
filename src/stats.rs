//! Sampling statistics.
//!
//! Counters are updated by the sampling loop and read for the shutdown summary
//! and the `test` subcommand.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::SystemTime;

/// Count, mean and peak of one sampled value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    max: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        self.max = if self.count == 0 { value } else { self.max.max(value) };
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// `RunningStat` shared between the loop and readers.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut stat) = self.inner.lock() {
            stat.add(value);
        }
    }

    /// Copy of the current values; empty if the lock is poisoned.
    pub fn snapshot(&self) -> RunningStat {
        self.inner.lock().map(|stat| *stat).unwrap_or_default()
    }
}

/// Counters for the sampling loop.
#[derive(Default)]
pub struct SamplerStats {
    pub ticks_total: AtomicU64,
    pub tick_failures: AtomicU64,
    pub records_emitted: AtomicU64,
    /// Lines that failed to parse.
    pub lines_skipped: AtomicU64,
    /// Lines dropped on purpose (user filter, incomplete Windows sample).
    pub records_dropped: AtomicU64,
    pub tick_duration_seconds: Stat,
    pub records_per_tick: Stat,
    last_tick: StdRwLock<Option<SystemTime>>,
}

/// Point-in-time copy of `SamplerStats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub ticks_total: u64,
    pub tick_failures: u64,
    pub records_emitted: u64,
    pub lines_skipped: u64,
    pub records_dropped: u64,
    pub avg_tick_duration_seconds: f64,
    pub max_tick_duration_seconds: f64,
    pub avg_records_per_tick: f64,
}

impl SamplerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_emitted(&self) {
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_line_skipped(&self) {
        self.lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed tick.
    pub fn record_tick(&self, emitted: u64, duration_seconds: f64) {
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
        self.tick_duration_seconds.add_sample(duration_seconds);
        self.records_per_tick.add_sample(emitted as f64);
        self.update_last_tick();
    }

    /// Records a tick that ended with an error.
    pub fn record_tick_failure(&self, duration_seconds: f64) {
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
        self.tick_failures.fetch_add(1, Ordering::Relaxed);
        self.tick_duration_seconds.add_sample(duration_seconds);
        self.update_last_tick();
    }

    fn update_last_tick(&self) {
        if let Ok(mut last) = self.last_tick.write() {
            *last = Some(SystemTime::now());
        }
    }

    pub fn last_tick(&self) -> Option<SystemTime> {
        self.last_tick.read().ok().and_then(|last| *last)
    }

    pub fn summary(&self) -> StatsSummary {
        let durations = self.tick_duration_seconds.snapshot();
        let records = self.records_per_tick.snapshot();
        StatsSummary {
            ticks_total: self.ticks_total.load(Ordering::Relaxed),
            tick_failures: self.tick_failures.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            lines_skipped: self.lines_skipped.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            avg_tick_duration_seconds: durations.avg(),
            max_tick_duration_seconds: durations.max(),
            avg_records_per_tick: records.avg(),
        }
    }
}
