use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_ROOT: &str = "/";
pub const PATH_HELLO: &str = "/hello";
pub const PATH_HELP: &str = "/help";
pub const PATH_DATA: &str = "/data";
pub const PATH_ECHO: &str = "/echo";
pub const PATH_SLOW: &str = "/slow";

pub const HELLO_BODY: &str = "Hello, World!\n";
pub const SLOW_DELAY: Duration = Duration::from_millis(50);

const ROOT_BODY: &str = "Use /help to see what's possible\n";
const HELP_BODY: &str = "\
/hello: Return a short message
/help: Return this message
/data?size=N: Return N bytes of data
/echo: POST a body and get it back
/slow: Reply after a short delay
";

/// Largest body `/data` will produce.
pub const MAX_DATA_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    bytes_echoed: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn add_bytes_echoed(&self, n: usize) {
        self.bytes_echoed.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn bytes_echoed(&self) -> u64 {
        self.bytes_echoed.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct TestServerUrls {
    pub base_url: String,
    pub hello: String,
    pub help: String,
    pub echo: String,
    pub slow: String,
}

impl TestServerUrls {
    pub fn new(base_url: String) -> Self {
        Self {
            hello: format!("{base_url}{PATH_HELLO}"),
            help: format!("{base_url}{PATH_HELP}"),
            echo: format!("{base_url}{PATH_ECHO}"),
            slow: format!("{base_url}{PATH_SLOW}"),
            base_url,
        }
    }

    /// URL of `/data` returning `size` bytes.
    pub fn data(&self, size: usize) -> String {
        format!("{}{PATH_DATA}?size={size}", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct DataQuery {
    #[serde(default)]
    size: usize,
}

async fn handle_root(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    ROOT_BODY
}

async fn handle_hello(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    HELLO_BODY
}

async fn handle_help(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    HELP_BODY
}

async fn handle_data(
    State(stats): State<TestServerStats>,
    Query(query): Query<DataQuery>,
) -> (StatusCode, Bytes) {
    stats.inc_requests_total();

    if query.size > MAX_DATA_SIZE {
        return (StatusCode::BAD_REQUEST, Bytes::from_static(b"size too large"));
    }
    (StatusCode::OK, Bytes::from(vec![b'a'; query.size]))
}

async fn handle_echo(
    State(stats): State<TestServerStats>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    stats.inc_requests_total();
    stats.add_bytes_echoed(body.len());

    let mut out = HeaderMap::new();
    if let Some(ct) = headers.get(header::CONTENT_TYPE) {
        out.insert(header::CONTENT_TYPE, ct.clone());
    }
    (StatusCode::OK, out, body)
}

async fn handle_slow(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    sleep(SLOW_DELAY).await;
    "slow"
}

/// Routes of the test target. Unknown paths get 404, known paths with the
/// wrong method get 405.
pub fn router(stats: TestServerStats) -> Router {
    Router::new()
        .route(PATH_ROOT, get(handle_root))
        .route(PATH_HELLO, get(handle_hello))
        .route(PATH_HELP, get(handle_help))
        .route(PATH_DATA, get(handle_data))
        .route(PATH_ECHO, post(handle_echo))
        .route(PATH_SLOW, get(handle_slow))
        .with_state(stats)
}

/// An in-process test target bound to an ephemeral localhost port.
pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    urls: TestServerUrls,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(stats.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        let base_url = format!("http://{addr}");
        let urls = TestServerUrls::new(base_url.clone());

        Ok(Self {
            addr,
            base_url,
            urls,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn urls(&self) -> &TestServerUrls {
        &self.urls
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
