use std::io::Write as _;
use std::sync::Arc;

use apib_core::Target;
use apib_core::runner::{ProgressFn, Report, RunConfig, SendOutcome};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput;

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, target: &Target, cfg: &RunConfig) {
        let warmup = if cfg.warmup.is_zero() {
            String::new()
        } else {
            format!(" after {}s warm-up", cfg.warmup.as_secs_f64())
        };
        println!(
            "Sending {} {} with {} workers for {}s{warmup}",
            target.method(),
            target.url(),
            cfg.workers,
            cfg.duration.as_secs_f64(),
        );
    }

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(|u| {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{u}");
        }))
    }

    fn print_single(&self, outcome: &SendOutcome) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(
            out,
            "{} ({} bytes sent, {} bytes received)",
            outcome.status, outcome.bytes_sent, outcome.bytes_received
        )?;
        Ok(())
    }

    fn print_summary(&self, report: &Report) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out)?;
        writeln!(out, "{report}")?;
        Ok(())
    }
}
