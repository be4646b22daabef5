mod buffer_pool;
mod collector;
mod config;
mod error;
mod progress;
mod report;
mod run;
mod sender;
mod worker;

pub use buffer_pool::{BufferPool, DEFAULT_BUFFER_SIZE, PooledBuffer};
pub use collector::{Collector, IntervalSnapshot, LocalCollector};
pub use config::{DEFAULT_DURATION, DEFAULT_PRINT_INTERVAL, RunConfig};
pub use error::{Error, Result};
pub use progress::{ProgressFn, ProgressUpdate};
pub use report::{LatencySummary, Report, percentile, percentile_index};
pub use run::{run, send_once};
pub use sender::{DEFAULT_REQUEST_TIMEOUT, SendOutcome, Sender};
pub use worker::{WorkerLoop, WorkerState};
