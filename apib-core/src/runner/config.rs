use std::time::Duration;

use super::error::{Error, Result};
use super::sender::DEFAULT_REQUEST_TIMEOUT;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(60);
pub const DEFAULT_PRINT_INTERVAL: Duration = Duration::from_secs(5);

/// Shape of a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Concurrent workers, each with at most one request in flight.
    pub workers: usize,
    /// Measured run length, after warm-up. Zero means one request and no loop.
    pub duration: Duration,
    /// Time spent sending before measurement begins.
    pub warmup: Duration,
    pub print_interval: Duration,
    /// Bound on a single request/response cycle.
    pub timeout: Duration,
    /// Dump every request and response as debug events.
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            duration: DEFAULT_DURATION,
            warmup: Duration::ZERO,
            print_interval: DEFAULT_PRINT_INTERVAL,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            verbose: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidWorkers);
        }
        if self.print_interval.is_zero() {
            return Err(Error::InvalidPrintInterval);
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidTimeout);
        }
        Ok(())
    }

    pub fn is_single_request(&self) -> bool {
        self.duration.is_zero()
    }

    /// Warm-up plus measured duration.
    pub fn total_duration(&self) -> Duration {
        self.warmup.saturating_add(self.duration)
    }
}
