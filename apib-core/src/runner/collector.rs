use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::report::{LatencySummary, Report, throughput};

/// One worker's private accumulator.
///
/// Not `Clone`: it is handed to [`Collector::merge`] by value exactly once.
#[derive(Debug, Default)]
pub struct LocalCollector {
    attempts: u64,
    successes: u64,
    failures: u64,
    bytes_sent: u64,
    bytes_received: u64,
    total_latency: Duration,
    latencies: Vec<Duration>,
}

impl LocalCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, latency: Duration) {
        self.attempts += 1;
        self.successes += 1;
        self.total_latency += latency;
        self.latencies.push(latency);
    }

    pub fn record_failure(&mut self) {
        self.attempts += 1;
        self.failures += 1;
    }

    pub fn record_transfer(&mut self, bytes_sent: u64, bytes_received: u64) {
        self.bytes_sent = self.bytes_sent.saturating_add(bytes_sent);
        self.bytes_received = self.bytes_received.saturating_add(bytes_received);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn latencies(&self) -> &[Duration] {
        &self.latencies
    }
}

/// Interval counters read and reset by the progress ticker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSnapshot {
    pub successes: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct Totals {
    attempts: u64,
    successes: u64,
    failures: u64,
    bytes_sent: u64,
    bytes_received: u64,
    total_latency: Duration,
    latencies: Vec<Duration>,
    merges: usize,
}

/// Run-wide aggregator shared by every worker.
///
/// The per-request path only touches atomics (and a short lock for the last
/// error). Totals are locked once per worker, when it merges on exit.
#[derive(Debug, Default)]
pub struct Collector {
    stopped: AtomicBool,
    warming_up: AtomicBool,
    interval_successes: AtomicU64,
    interval_failures: AtomicU64,
    last_error: Mutex<Option<String>>,
    totals: Mutex<Totals>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn set_warming_up(&self, warming_up: bool) {
        self.warming_up.store(warming_up, Ordering::Release);
    }

    pub fn is_warming_up(&self) -> bool {
        self.warming_up.load(Ordering::Acquire)
    }

    /// Count a success for live progress. Returns whether the worker should stop.
    pub fn record_live_success(&self) -> bool {
        self.interval_successes.fetch_add(1, Ordering::Relaxed);
        self.is_stopped()
    }

    /// Count a failure for live progress and remember its message.
    /// Returns whether the worker should stop.
    pub fn record_live_failure(&self, err: &dyn fmt::Display) -> bool {
        self.interval_failures.fetch_add(1, Ordering::Relaxed);
        let text = err.to_string();
        // Last writer wins. Formatting happens outside the lock.
        *self.last_error.lock() = Some(text);
        self.is_stopped()
    }

    pub fn merge(&self, local: LocalCollector) {
        let mut totals = self.totals.lock();
        totals.attempts += local.attempts;
        totals.successes += local.successes;
        totals.failures += local.failures;
        totals.bytes_sent = totals.bytes_sent.saturating_add(local.bytes_sent);
        totals.bytes_received = totals.bytes_received.saturating_add(local.bytes_received);
        totals.total_latency += local.total_latency;
        totals.latencies.extend(local.latencies);
        totals.merges += 1;
    }

    /// Number of workers merged so far.
    pub fn merges(&self) -> usize {
        self.totals.lock().merges
    }

    pub fn drain_interval(&self) -> IntervalSnapshot {
        IntervalSnapshot {
            successes: self.interval_successes.swap(0, Ordering::Relaxed),
            failures: self.interval_failures.swap(0, Ordering::Relaxed),
            last_error: self.last_error.lock().take(),
        }
    }

    /// Build the final report. Only meaningful once every worker has merged.
    pub fn final_report(&self, run_start: Instant, run_end: Instant) -> Report {
        let duration = run_end.saturating_duration_since(run_start);
        let mut totals = self.totals.lock();
        totals.latencies.sort_unstable();

        Report {
            duration,
            attempts: totals.attempts,
            successes: totals.successes,
            failures: totals.failures,
            connections_opened: 0,
            bytes_sent: totals.bytes_sent,
            bytes_received: totals.bytes_received,
            throughput: throughput(totals.successes, duration),
            latency: LatencySummary::from_sorted(&totals.latencies, totals.total_latency),
        }
    }
}
