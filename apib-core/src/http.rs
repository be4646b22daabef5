mod client;
mod connector;
mod error;
mod estimate;
mod target;

pub use client::{DEFAULT_CONNECT_TIMEOUT, HttpClient};
pub use error::{Error, ErrorKind, Result};
pub use estimate::{estimate_request_bytes, estimate_response_head_bytes};
pub use target::Target;
