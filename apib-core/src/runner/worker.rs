use std::sync::Arc;
use std::time::{Duration, Instant};

use super::collector::{Collector, LocalCollector};
use super::sender::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum WorkerState {
    Running,
    Stopping,
    Done,
}

/// Drives the shared [`Sender`] until the [`Collector`] says stop.
///
/// The loop never looks at a clock to decide when to stop; the answer comes
/// back from the live-recording call after every attempt. Once stopping, the
/// local accumulator is merged exactly once.
#[derive(Debug)]
pub struct WorkerLoop {
    id: usize,
    sender: Arc<Sender>,
    collector: Arc<Collector>,
    timeout: Duration,
    local: LocalCollector,
    state: WorkerState,
    attempts: u64,
}

impl WorkerLoop {
    pub fn new(
        id: usize,
        sender: Arc<Sender>,
        collector: Arc<Collector>,
        timeout: Duration,
    ) -> Self {
        Self {
            id,
            sender,
            collector,
            timeout,
            local: LocalCollector::new(),
            state: WorkerState::Running,
            attempts: 0,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Attempts made by this worker, including warm-up ones.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Make one attempt. No-op unless running.
    pub async fn step(&mut self) -> WorkerState {
        if self.state != WorkerState::Running {
            return self.state;
        }

        let started = Instant::now();
        let res = self.sender.send(self.timeout).await;
        let latency = started.elapsed();
        self.attempts += 1;

        let record = !self.collector.is_warming_up();
        let stop = match res {
            Ok(outcome) => {
                if record {
                    self.local.record_success(latency);
                    self.local
                        .record_transfer(outcome.bytes_sent, outcome.bytes_received);
                }
                self.collector.record_live_success()
            }
            Err(err) => {
                tracing::debug!(worker = self.id, kind = %err.kind(), error = %err, "request failed");
                if record {
                    self.local.record_failure();
                }
                self.collector.record_live_failure(&err)
            }
        };

        if stop {
            self.state = WorkerState::Stopping;
        }
        self.state
    }

    /// Hand the local accumulator to the collector. Only the first call merges.
    pub fn finish(&mut self) {
        if self.state == WorkerState::Done {
            return;
        }
        let local = std::mem::take(&mut self.local);
        tracing::trace!(
            worker = self.id,
            attempts = local.attempts(),
            "merging worker results"
        );
        self.collector.merge(local);
        self.state = WorkerState::Done;
    }

    /// Loop until stopped, merge, and return the number of attempts made.
    pub async fn run(mut self) -> u64 {
        tracing::trace!(worker = self.id, "worker started");
        while self.step().await == WorkerState::Running {}
        self.finish();
        tracing::trace!(worker = self.id, attempts = self.attempts, "worker done");
        self.attempts
    }
}
