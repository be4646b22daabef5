use std::time::Duration;

use bytes::Buf as _;
use http::StatusCode;
use http_body_util::BodyExt as _;
use hyper::body::Incoming;

use super::buffer_pool::BufferPool;
use crate::{Error, HttpClient, Result, Target, estimate_response_head_bytes};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// What one successful exchange moved over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOutcome {
    pub status: StatusCode,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Issues the run's fixed request over a shared, pooled client.
///
/// One `Sender` is shared by all workers; each call is an independent exchange.
#[derive(Debug)]
pub struct Sender {
    client: HttpClient,
    target: Target,
    buffers: BufferPool,
    verbose: bool,
}

impl Sender {
    pub fn new(client: HttpClient, target: Target, buffers: BufferPool) -> Self {
        Self {
            client,
            target,
            buffers,
            verbose: false,
        }
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Run one request/response cycle, reading the body to completion.
    ///
    /// `timeout` bounds the whole exchange, body included. Any status outside
    /// 2xx is an error; its body is still drained so the connection is reusable.
    pub async fn send(&self, timeout: Duration) -> Result<SendOutcome> {
        match tokio::time::timeout(timeout, self.exchange()).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout(timeout)),
        }
    }

    async fn exchange(&self) -> Result<SendOutcome> {
        if self.verbose {
            self.dump_request();
        }

        let resp = self.client.request(self.target.request()).await?;
        let (parts, body) = resp.into_parts();

        if self.verbose {
            tracing::debug!(
                status = %parts.status,
                version = ?parts.version,
                headers = ?parts.headers,
                "response"
            );
        }

        let head_bytes = estimate_response_head_bytes(parts.version, parts.status, &parts.headers);

        if !parts.status.is_success() {
            let _ = self.drain(body).await;
            return Err(Error::Status(parts.status.as_u16()));
        }

        let body_bytes = self.drain(body).await?;
        if self.verbose {
            tracing::debug!(bytes = body_bytes, "response body read");
        }

        Ok(SendOutcome {
            status: parts.status,
            bytes_sent: self.target.bytes_sent(),
            bytes_received: head_bytes.saturating_add(body_bytes),
        })
    }

    /// Read the body to exhaustion through a pooled scratch buffer.
    async fn drain(&self, mut body: Incoming) -> Result<u64> {
        let mut buf = self.buffers.get();
        let mut bytes_read = 0u64;

        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(|source| Error::BodyRead { bytes_read, source })?;
            let Ok(mut data) = frame.into_data() else {
                continue;
            };
            while data.has_remaining() {
                let n = data.remaining().min(buf.len());
                data.copy_to_slice(&mut buf[..n]);
                bytes_read += n as u64;
            }
        }

        Ok(bytes_read)
    }

    fn dump_request(&self) {
        let t = &self.target;
        tracing::debug!(
            method = %t.method(),
            url = t.url(),
            headers = ?t.headers(),
            body_len = t.body().len(),
            "request"
        );
    }
}
