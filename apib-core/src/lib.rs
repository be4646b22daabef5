#![forbid(unsafe_code)]

mod http;
pub mod runner;

pub use self::http::{
    DEFAULT_CONNECT_TIMEOUT, Error, ErrorKind, HttpClient, Result, Target, estimate_request_bytes,
    estimate_response_head_bytes,
};
