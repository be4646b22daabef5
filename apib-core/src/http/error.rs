use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The target could not be turned into a request. Fatal before a run starts.
    Configuration,
    /// DNS, connect, reset or timeout.
    Transport,
    /// The server answered with a non-2xx status.
    Protocol,
    /// The response body stream failed partway through.
    BodyRead,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unsupported url scheme `{scheme}` (expected http or https): {url}")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("invalid http method: {0}")]
    InvalidMethod(String),

    #[error("invalid http header `{0}` (expected name:value)")]
    InvalidHeader(String),

    #[error("invalid http header name: {0}")]
    HeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid http header value: {0}")]
    HeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("request error: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("received error status: {0}")]
    Status(u16),

    #[error("received error {source} after reading {bytes_read} bytes")]
    BodyRead {
        bytes_read: u64,
        #[source]
        source: hyper::Error,
    },
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl(_)
            | Self::UnsupportedScheme { .. }
            | Self::InvalidMethod(_)
            | Self::InvalidHeader(_)
            | Self::HeaderName(_)
            | Self::HeaderValue(_) => ErrorKind::Configuration,
            Self::Request(_) | Self::Timeout(_) => ErrorKind::Transport,
            Self::Status(_) => ErrorKind::Protocol,
            Self::BodyRead { .. } => ErrorKind::BodyRead,
        }
    }
}
