use crate::cli::OutputFormat;
use apib_core::Target;
use apib_core::runner::{ProgressFn, Report, RunConfig, SendOutcome};

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, target: &Target, cfg: &RunConfig);
    fn progress(&self) -> Option<ProgressFn>;
    fn print_single(&self, outcome: &SendOutcome) -> anyhow::Result<()>;
    fn print_summary(&self, report: &Report) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
