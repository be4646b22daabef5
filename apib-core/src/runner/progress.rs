use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::collector::IntervalSnapshot;
use super::report::throughput;

/// One progress tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Time since the run began, warm-up included.
    pub elapsed: Duration,
    /// Planned length of the run, warm-up included.
    pub total: Duration,
    /// Length of the interval this tick covers.
    pub interval: Duration,
    pub successes: u64,
    pub failures: u64,
    /// Successful requests per second over the interval.
    pub throughput: f64,
    pub warming_up: bool,
    pub last_error: Option<String>,
}

impl ProgressUpdate {
    pub(crate) fn from_snapshot(
        snap: IntervalSnapshot,
        elapsed: Duration,
        total: Duration,
        interval: Duration,
        warming_up: bool,
    ) -> Self {
        Self {
            elapsed,
            total,
            interval,
            successes: snap.successes,
            failures: snap.failures,
            throughput: throughput(snap.successes, interval),
            warming_up,
            last_error: snap.last_error,
        }
    }
}

impl fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} / {}) {:.3}",
            self.elapsed.as_secs(),
            self.total.as_secs(),
            self.throughput
        )?;
        if self.warming_up {
            f.write_str(" (warming up)")?;
        }
        if self.failures > 0 {
            write!(f, " ({} errors)", self.failures)?;
            if let Some(err) = &self.last_error {
                write!(f, "\n  {err}")?;
            }
        }
        Ok(())
    }
}

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;
