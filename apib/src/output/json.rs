use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;

use apib_core::Target;
use apib_core::runner::{LatencySummary, ProgressFn, ProgressUpdate, Report, RunConfig, SendOutcome};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _target: &Target, _cfg: &RunConfig) {}

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(move |u| {
            emit_json_line(&build_progress_line(&u));
        }))
    }

    fn print_single(&self, outcome: &SendOutcome) -> anyhow::Result<()> {
        emit_json_line(&JsonSingleLine {
            kind: "single",
            status: outcome.status.as_u16(),
            bytes_sent: outcome.bytes_sent,
            bytes_received: outcome.bytes_received,
        });
        Ok(())
    }

    fn print_summary(&self, report: &Report) -> anyhow::Result<()> {
        emit_json_line(&build_summary_line(report));
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub elapsed_secs: u64,
    pub total_secs: u64,
    pub interval_secs: f64,
    pub successes: u64,
    pub failures: u64,
    pub requests_per_sec: f64,
    pub warming_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

fn build_progress_line(u: &ProgressUpdate) -> JsonProgressLine {
    JsonProgressLine {
        kind: "progress",
        elapsed_secs: u.elapsed.as_secs(),
        total_secs: u.total.as_secs(),
        interval_secs: u.interval.as_secs_f64(),
        successes: u.successes,
        failures: u.failures,
        requests_per_sec: u.throughput,
        warming_up: u.warming_up,
        last_error: u.last_error.clone(),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonLatency {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl From<&LatencySummary> for JsonLatency {
    fn from(l: &LatencySummary) -> Self {
        let ms = |d: std::time::Duration| d.as_nanos() as f64 / 1e6;
        Self {
            mean: ms(l.mean),
            min: ms(l.min),
            max: ms(l.max),
            p50: ms(l.p50),
            p90: ms(l.p90),
            p95: ms(l.p95),
            p99: ms(l.p99),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub duration_secs: f64,
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub connections_opened: u64,
    pub requests_per_sec: f64,
    /// Milliseconds.
    pub latency_ms: JsonLatency,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub send_rate_mbps: f64,
    pub receive_rate_mbps: f64,
}

fn build_summary_line(r: &Report) -> JsonSummaryLine {
    JsonSummaryLine {
        kind: "summary",
        duration_secs: r.duration.as_secs_f64(),
        attempts: r.attempts,
        successes: r.successes,
        failures: r.failures,
        connections_opened: r.connections_opened,
        requests_per_sec: r.throughput,
        latency_ms: JsonLatency::from(&r.latency),
        bytes_sent: r.bytes_sent,
        bytes_received: r.bytes_received,
        send_rate_mbps: r.send_rate_mbps(),
        receive_rate_mbps: r.receive_rate_mbps(),
    }
}

#[derive(Debug, Serialize)]
struct JsonSingleLine {
    kind: &'static str,
    status: u16,
    bytes_sent: u64,
    bytes_received: u64,
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
