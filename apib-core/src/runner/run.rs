use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::buffer_pool::BufferPool;
use super::collector::Collector;
use super::config::RunConfig;
use super::error::Result;
use super::progress::{ProgressFn, ProgressUpdate};
use super::report::Report;
use super::sender::{SendOutcome, Sender};
use super::worker::WorkerLoop;
use crate::{DEFAULT_CONNECT_TIMEOUT, HttpClient, Target};

/// Run a fixed-duration benchmark against `target` and return the final report.
///
/// Workers start immediately. If a warm-up is configured its attempts only feed
/// progress output, and measurement restarts when it ends. A one-shot timer
/// raises the stop flag at the deadline; workers notice it after their current
/// request, merge, and exit. The report is built after every worker is joined.
pub async fn run(cfg: &RunConfig, target: Target, progress: Option<ProgressFn>) -> Result<Report> {
    cfg.validate()?;

    let sender = Arc::new(build_sender(cfg, target));
    let collector = Arc::new(Collector::new());
    let warmup = !cfg.warmup.is_zero();
    collector.set_warming_up(warmup);

    let began = Instant::now();
    let total = cfg.total_duration();

    tracing::debug!(
        url = sender.target().url(),
        workers = cfg.workers,
        duration = ?cfg.duration,
        warmup = ?cfg.warmup,
        "starting run"
    );

    let mut handles = Vec::with_capacity(cfg.workers);
    for id in 0..cfg.workers {
        let worker = WorkerLoop::new(id, sender.clone(), collector.clone(), cfg.timeout);
        handles.push(tokio::spawn(worker.run()));
    }

    let deadline = {
        let collector = collector.clone();
        let at = tokio::time::Instant::from_std(began + total);
        tokio::spawn(async move {
            tokio::time::sleep_until(at).await;
            collector.stop();
        })
    };

    let ticker = progress
        .map(|p| spawn_ticker(collector.clone(), p, began, total, cfg.print_interval));

    let mut start = began;
    if warmup {
        tokio::time::sleep(cfg.warmup).await;
        start = Instant::now();
        collector.set_warming_up(false);
        tracing::debug!("warm-up finished");
    }

    let joined = join_workers(handles, &collector).await;
    let end = Instant::now();

    deadline.abort();
    if let Some(t) = ticker {
        t.abort();
    }
    let attempts = joined?;

    let mut report = collector.final_report(start, end);
    report.connections_opened = sender.client().connections_opened();

    tracing::debug!(
        attempts,
        measured = report.attempts,
        successes = report.successes,
        failures = report.failures,
        "run finished"
    );

    Ok(report)
}

/// Send the target exactly once, with no loop and no statistics.
pub async fn send_once(cfg: &RunConfig, target: Target) -> Result<SendOutcome> {
    cfg.validate()?;
    let sender = build_sender(&RunConfig { workers: 1, ..cfg.clone() }, target);
    Ok(sender.send(cfg.timeout).await?)
}

fn build_sender(cfg: &RunConfig, target: Target) -> Sender {
    let client = HttpClient::new(cfg.workers, Some(DEFAULT_CONNECT_TIMEOUT));
    Sender::new(client, target, BufferPool::for_workers(cfg.workers)).with_verbose(cfg.verbose)
}

/// Join every worker. A failed join stops the rest and is reported once all
/// of them have exited.
async fn join_workers(handles: Vec<JoinHandle<u64>>, collector: &Collector) -> Result<u64> {
    let mut attempts = 0u64;
    let mut first_err = None;
    for h in handles {
        match h.await {
            Ok(n) => attempts += n,
            Err(err) => {
                tracing::warn!(error = %err, "worker task failed");
                collector.stop();
                first_err.get_or_insert(err);
            }
        }
    }
    match first_err {
        Some(err) => Err(err.into()),
        None => Ok(attempts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Error;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn failed_worker_stops_the_others_before_returning() {
        let collector = Arc::new(Collector::new());
        let survivor_done = Arc::new(AtomicBool::new(false));

        let failing: JoinHandle<u64> = tokio::spawn(async { panic!("worker blew up") });
        let survivor = {
            let collector = collector.clone();
            let done = survivor_done.clone();
            tokio::spawn(async move {
                while !collector.is_stopped() {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                done.store(true, Ordering::SeqCst);
                7
            })
        };

        let res = join_workers(vec![failing, survivor], &collector).await;

        assert!(matches!(res, Err(Error::Join(_))));
        assert!(collector.is_stopped());
        assert!(survivor_done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn clean_join_sums_attempts() {
        let collector = Collector::new();
        let handles = vec![tokio::spawn(async { 2 }), tokio::spawn(async { 3 })];

        let res = join_workers(handles, &collector).await;
        assert!(matches!(res, Ok(5)));
        assert!(!collector.is_stopped());
    }
}

fn spawn_ticker(
    collector: Arc<Collector>,
    progress: ProgressFn,
    began: Instant,
    total: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let first = tokio::time::Instant::from_std(began) + every;
        let mut interval = tokio::time::interval_at(first, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last = began;
        loop {
            interval.tick().await;
            if collector.is_stopped() {
                break;
            }
            let now = Instant::now();
            let update = ProgressUpdate::from_snapshot(
                collector.drain_interval(),
                now.saturating_duration_since(began),
                total,
                now.saturating_duration_since(last),
                collector.is_warming_up(),
            );
            last = now;
            progress(update);
        }
    })
}
