use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

const DURATION_HINT: &str = "expected e.g. 10s, 250ms, 1m";

/// Parse `10s`, `250ms`, `1m`, `1h`; a bare number is seconds.
fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err(format!("duration cannot be empty ({DURATION_HINT})"));
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);
    if number_end == 0 {
        return Err(format!("invalid duration '{s}' ({DURATION_HINT})"));
    }

    let (number_str, unit) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' ({DURATION_HINT})"))?;

    let too_large = || format!("duration '{s}' is too large");
    match unit.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(value)),
        "ms" | "millisecond" | "milliseconds" => Ok(Duration::from_millis(value)),
        "m" | "min" | "mins" | "minute" | "minutes" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(too_large),
        "h" | "hour" | "hours" => value
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(too_large),
        _ => Err(format!("invalid duration '{s}' ({DURATION_HINT})")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress lines and a labeled final report.
    HumanReadable,
    /// NDJSON progress lines and a final summary line on stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "apib",
    author,
    version,
    about = "HTTP throughput and latency benchmarking tool",
    long_about = "apib sends one fixed HTTP request over and over from many concurrent workers for a fixed duration, then reports throughput and latency percentiles.\n\nSet RUST_LOG to control diagnostic logging on stderr.",
    after_help = "Examples:\n  apib http://localhost:8080/hello\n  apib -c 50 -d 30s http://localhost:8080/hello\n  apib -X POST -t '{\"ping\":true}' -H 'Content-Type: application/json' http://localhost:8080/echo\n  apib -1 -v https://example.com/"
)]
pub struct Cli {
    /// The URL to test
    pub url: String,

    /// Number of concurrent workers
    #[arg(short = 'c', long, default_value_t = 1)]
    pub concurrency: usize,

    /// Measured run duration (e.g. 10s, 250ms, 1m); 0 sends a single request
    #[arg(short = 'd', long, value_parser = parse_duration, default_value = "60s")]
    pub duration: Duration,

    /// Warm-up before measurement starts
    #[arg(short = 'w', long, value_parser = parse_duration, default_value = "0s")]
    pub warmup: Duration,

    /// How often to print progress
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    pub print_interval: Duration,

    /// HTTP method (defaults to POST with a body, GET otherwise)
    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// Send only one request and exit
    #[arg(short = '1', long = "one")]
    pub just_one: bool,

    /// Data to send in the request body
    #[arg(short = 't', long = "body-text", conflicts_with = "body_file")]
    pub body_text: Option<String>,

    /// File to read the request body from
    #[arg(short = 'T', long = "body-file")]
    pub body_file: Option<PathBuf>,

    /// Extra request header, repeatable (name:value)
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Per-request timeout, response body included
    #[arg(long, value_parser = parse_duration, default_value = "60s")]
    pub timeout: Duration,

    /// Log every request and response at debug level
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

impl Cli {
    pub fn is_single_request(&self) -> bool {
        self.just_one || self.duration.is_zero()
    }
}
