use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::Result;
use super::connector::CountingConnector;

/// Connect timeout used by runs; the OS default can be tens of seconds.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

type Connector = CountingConnector<HttpsConnector<HttpConnector>>;

/// A pooled HTTP/1.1 client shared by every worker of a run.
///
/// Cloning is cheap and clones share the same connection pool and counters.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<Connector, Full<Bytes>>,
    connections_opened: Arc<AtomicU64>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(1, Some(DEFAULT_CONNECT_TIMEOUT))
    }
}

impl HttpClient {
    /// Build a client whose idle pool holds up to `2 * expected_connections`
    /// connections per host.
    #[must_use]
    pub fn new(expected_connections: usize, connect_timeout: Option<Duration>) -> Self {
        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_nodelay(true);
        http_connector.set_connect_timeout(connect_timeout);

        let https_connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let connections_opened = Arc::new(AtomicU64::new(0));
        let connector = CountingConnector::new(https_connector, connections_opened.clone());

        let inner = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(expected_connections.max(1).saturating_mul(2))
            .build(connector);

        Self {
            inner,
            connections_opened,
        }
    }

    /// Send a request and return the response head with the body still unread.
    pub async fn request(&self, req: Request<Full<Bytes>>) -> Result<Response<Incoming>> {
        Ok(self.inner.request(req).await?)
    }

    /// Number of connections opened so far (not counting pooled reuse).
    pub fn connections_opened(&self) -> u64 {
        self.connections_opened.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::Target;
    use std::time::Instant;

    #[tokio::test]
    async fn unreachable_host_fails_fast_with_connect_timeout() {
        let client = HttpClient::new(1, Some(Duration::from_millis(200)));
        let target = Target::get("http://192.0.2.1:81/").unwrap();

        let started = Instant::now();
        let _err = client.request(target.request()).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(
            elapsed < Duration::from_secs(2),
            "expected fast failure, elapsed={elapsed:?}"
        );
        assert_eq!(client.connections_opened(), 0);
    }
}
