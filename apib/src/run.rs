use anyhow::Context as _;
use bytes::Bytes;

use apib_core::Target;
use apib_core::runner::{self, RunConfig};

use crate::cli::Cli;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(cli: Cli) -> Result<ExitCode, RunError> {
    let out = output::formatter(cli.output);

    let body = read_body(&cli).await.map_err(RunError::InvalidInput)?;
    let target = Target::new(&cli.url, cli.method.as_deref(), &cli.headers, body)
        .map_err(|err| RunError::InvalidInput(err.into()))?;
    let cfg = run_config(&cli);

    if cli.is_single_request() {
        let outcome = match runner::send_once(&cfg, target).await {
            Ok(v) => v,
            Err(runner::Error::Http(err)) => {
                return Err(RunError::RequestFailed(
                    anyhow::Error::new(err).context("error on send"),
                ));
            }
            Err(err) => return Err(err.into()),
        };
        out.print_single(&outcome).map_err(RunError::RuntimeError)?;
        return Ok(ExitCode::Success);
    }

    cfg.validate()?;
    out.print_header(&target, &cfg);

    let report = runner::run(&cfg, target, out.progress()).await?;
    out.print_summary(&report).map_err(RunError::RuntimeError)?;

    Ok(ExitCode::Success)
}

fn run_config(cli: &Cli) -> RunConfig {
    RunConfig {
        workers: cli.concurrency,
        duration: cli.duration,
        warmup: cli.warmup,
        print_interval: cli.print_interval,
        timeout: cli.timeout,
        verbose: cli.verbose,
    }
}

async fn read_body(cli: &Cli) -> anyhow::Result<Bytes> {
    if let Some(text) = &cli.body_text {
        return Ok(Bytes::from(text.clone()));
    }
    if let Some(path) = &cli.body_file {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("read body file {}", path.display()))?;
        return Ok(Bytes::from(data));
    }
    Ok(Bytes::new())
}
