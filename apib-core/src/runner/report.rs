use std::fmt;
use std::time::Duration;

const BITS_PER_MEGABIT: f64 = 1024.0 * 1024.0;

/// Index of the `pct`th percentile in an ascending slice of length `n`.
///
/// `floor((n - 1) * pct / 100)`, so p0 is the minimum and p100 the maximum.
#[must_use]
pub fn percentile_index(n: usize, pct: u8) -> usize {
    if n == 0 {
        return 0;
    }
    (n - 1) * usize::from(pct.min(100)) / 100
}

/// Percentile of an ascending-sorted slice, `Duration::ZERO` when empty.
#[must_use]
pub fn percentile(sorted: &[Duration], pct: u8) -> Duration {
    sorted
        .get(percentile_index(sorted.len(), pct))
        .copied()
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencySummary {
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

impl LatencySummary {
    /// Summarize ascending-sorted successful latencies.
    #[must_use]
    pub fn from_sorted(sorted: &[Duration], total: Duration) -> Self {
        let mean = match u32::try_from(sorted.len()) {
            Ok(0) => Duration::ZERO,
            Ok(n) => total / n,
            Err(_) => Duration::from_secs_f64(total.as_secs_f64() / sorted.len() as f64),
        };

        Self {
            mean,
            min: percentile(sorted, 0),
            max: percentile(sorted, 100),
            p50: percentile(sorted, 50),
            p90: percentile(sorted, 90),
            p95: percentile(sorted, 95),
            p99: percentile(sorted, 99),
        }
    }
}

/// Final results of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub duration: Duration,
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub connections_opened: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Successful requests per second, 0 for a zero-length run.
    pub throughput: f64,
    pub latency: LatencySummary,
}

impl Report {
    pub fn send_rate_mbps(&self) -> f64 {
        megabits_per_sec(self.bytes_sent, self.duration)
    }

    pub fn receive_rate_mbps(&self) -> f64 {
        megabits_per_sec(self.bytes_received, self.duration)
    }
}

#[must_use]
pub fn throughput(successes: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    successes as f64 / duration.as_secs_f64()
}

fn megabits_per_sec(bytes: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    (bytes as f64 * 8.0) / BITS_PER_MEGABIT / duration.as_secs_f64()
}

pub(crate) fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = &self.latency;
        writeln!(f, "Duration:            {:.3} seconds", self.duration.as_secs_f64())?;
        writeln!(f, "Attempted requests:  {}", self.attempts)?;
        writeln!(f, "Successful requests: {}", self.successes)?;
        writeln!(f, "Errors:              {}", self.failures)?;
        writeln!(f, "Connections opened:  {}", self.connections_opened)?;
        writeln!(f)?;
        writeln!(f, "Throughput:          {:.3} requests/second", self.throughput)?;
        writeln!(f, "Average latency:     {:.3} milliseconds", millis(l.mean))?;
        writeln!(f, "Minimum latency:     {:.3} milliseconds", millis(l.min))?;
        writeln!(f, "Maximum latency:     {:.3} milliseconds", millis(l.max))?;
        writeln!(f, "50% latency:         {:.3} milliseconds", millis(l.p50))?;
        writeln!(f, "90% latency:         {:.3} milliseconds", millis(l.p90))?;
        writeln!(f, "95% latency:         {:.3} milliseconds", millis(l.p95))?;
        writeln!(f, "99% latency:         {:.3} milliseconds", millis(l.p99))?;
        writeln!(f, "Bytes sent:          {} bytes", self.bytes_sent)?;
        writeln!(
            f,
            "Send rate:           {:.3} megabits / second",
            self.send_rate_mbps()
        )?;
        writeln!(f, "Bytes received:      {} bytes", self.bytes_received)?;
        write!(
            f,
            "Receive rate:        {:.3} megabits / second",
            self.receive_rate_mbps()
        )
    }
}
