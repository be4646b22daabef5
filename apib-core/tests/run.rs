use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use apib_core::runner::{
    BufferPool, Collector, ProgressFn, ProgressUpdate, RunConfig, Sender, WorkerLoop, WorkerState,
    run, send_once,
};
use apib_core::{HttpClient, Target};
use apib_testserver::TestServer;
use parking_lot::Mutex;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_ok_responses_with_four_workers() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let cfg = RunConfig {
        workers: 4,
        duration: Duration::from_secs(2),
        ..RunConfig::default()
    };

    let report = run(&cfg, Target::get(&server.urls().data(0))?, None).await?;

    anyhow::ensure!(report.attempts > 0);
    anyhow::ensure!(report.attempts == report.successes, "report={report:?}");
    anyhow::ensure!(report.failures == 0);
    anyhow::ensure!(report.throughput > 0.0);
    anyhow::ensure!(report.duration >= Duration::from_secs(2));
    anyhow::ensure!(report.latency.min <= report.latency.p50);
    anyhow::ensure!(report.latency.p99 <= report.latency.max);
    anyhow::ensure!(report.connections_opened >= 1);
    anyhow::ensure!(
        report.connections_opened < report.attempts,
        "connections should be reused: {report:?}"
    );
    anyhow::ensure!(report.bytes_sent > 0 && report.bytes_received > 0);
    anyhow::ensure!(server.stats().requests_total() >= report.attempts);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn always_not_found_reports_zero_latency() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let cfg = RunConfig {
        workers: 2,
        duration: Duration::from_millis(500),
        ..RunConfig::default()
    };

    let url = format!("{}/missing", server.base_url());
    let report = run(&cfg, Target::get(&url)?, None).await?;

    anyhow::ensure!(report.successes == 0, "report={report:?}");
    anyhow::ensure!(report.failures > 0);
    anyhow::ensure!(report.attempts == report.failures);
    anyhow::ensure!(report.throughput == 0.0);
    anyhow::ensure!(report.latency.mean == Duration::ZERO);
    anyhow::ensure!(report.latency.max == Duration::ZERO);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn stopped_worker_makes_exactly_one_attempt() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let sender = Arc::new(Sender::new(
        HttpClient::default(),
        Target::get(&server.urls().hello)?,
        BufferPool::for_workers(1),
    ));
    let collector = Arc::new(Collector::new());
    collector.stop();

    let mut worker = WorkerLoop::new(0, sender.clone(), collector.clone(), Duration::from_secs(5));
    anyhow::ensure!(worker.step().await == WorkerState::Stopping);
    // Further steps are no-ops.
    anyhow::ensure!(worker.step().await == WorkerState::Stopping);
    anyhow::ensure!(worker.attempts() == 1);

    worker.finish();
    worker.finish();
    anyhow::ensure!(worker.state() == WorkerState::Done);
    anyhow::ensure!(collector.merges() == 1);
    anyhow::ensure!(server.stats().requests_total() == 1);

    let attempts =
        WorkerLoop::new(1, sender, collector.clone(), Duration::from_secs(5)).run().await;
    anyhow::ensure!(attempts == 1);
    anyhow::ensure!(collector.merges() == 2);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn warm_up_attempts_are_not_measured() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let sender = Arc::new(Sender::new(
        HttpClient::default(),
        Target::get(&server.urls().hello)?,
        BufferPool::for_workers(1),
    ));
    let collector = Arc::new(Collector::new());
    collector.set_warming_up(true);

    let mut worker = WorkerLoop::new(0, sender, collector.clone(), Duration::from_secs(5));
    worker.step().await;
    worker.step().await;
    collector.set_warming_up(false);
    collector.stop();
    worker.step().await;
    worker.finish();

    let now = std::time::Instant::now();
    let report = collector.final_report(now, now);
    anyhow::ensure!(worker.attempts() == 3);
    anyhow::ensure!(report.attempts == 1, "report={report:?}");
    anyhow::ensure!(collector.drain_interval().successes == 3);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn progress_ticks_during_run() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let cfg = RunConfig {
        workers: 2,
        duration: Duration::from_millis(800),
        warmup: Duration::from_millis(300),
        print_interval: Duration::from_millis(200),
        ..RunConfig::default()
    };

    let seen: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let progress: ProgressFn = {
        let seen = seen.clone();
        Arc::new(move |u: ProgressUpdate| seen.lock().push(u))
    };

    let report = run(&cfg, Target::get(&server.urls().hello)?, Some(progress)).await?;

    let updates = seen.lock().clone();
    anyhow::ensure!(updates.len() >= 2, "updates={}", updates.len());
    anyhow::ensure!(updates.iter().all(|u| u.total == Duration::from_millis(1100)));
    anyhow::ensure!(updates[0].warming_up, "first tick should be in warm-up");
    anyhow::ensure!(updates.iter().any(|u| !u.warming_up));
    anyhow::ensure!(updates.iter().any(|u| u.successes > 0));

    // Only post-warm-up attempts are measured.
    anyhow::ensure!(report.duration < Duration::from_millis(1100));
    anyhow::ensure!(report.attempts < server.stats().requests_total());

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn single_request_reports_outcome_or_error() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let cfg = RunConfig {
        duration: Duration::ZERO,
        ..RunConfig::default()
    };

    let outcome = send_once(&cfg, Target::get(&server.urls().hello)?).await?;
    anyhow::ensure!(outcome.status.as_u16() == 200);

    let url = format!("{}/missing", server.base_url());
    let err = match send_once(&cfg, Target::get(&url)?).await {
        Ok(outcome) => anyhow::bail!("expected failure, got {}", outcome.status),
        Err(err) => err,
    };
    anyhow::ensure!(
        matches!(err, apib_core::runner::Error::Http(apib_core::Error::Status(404))),
        "err={err}"
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn invalid_config_is_rejected_before_any_request() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let cfg = RunConfig {
        workers: 0,
        ..RunConfig::default()
    };

    let res = run(&cfg, Target::get(&server.urls().hello)?, None).await;
    anyhow::ensure!(matches!(res, Err(apib_core::runner::Error::InvalidWorkers)));
    anyhow::ensure!(server.stats().requests_total() == 0);

    server.shutdown().await;
    Ok(())
}
