use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use http::Uri;
use tower::Service;

/// Wraps a connector and counts every connection it successfully opens.
///
/// The pool hands out reused connections without going through the connector,
/// so the counter is the number of distinct connections the run needed.
#[derive(Debug, Clone)]
pub(crate) struct CountingConnector<C> {
    inner: C,
    opened: Arc<AtomicU64>,
}

impl<C> CountingConnector<C> {
    pub(crate) fn new(inner: C, opened: Arc<AtomicU64>) -> Self {
        Self { inner, opened }
    }
}

impl<C> Service<Uri> for CountingConnector<C>
where
    C: Service<Uri> + Send + 'static,
    C::Future: Send + 'static,
{
    type Response = C::Response;
    type Error = C::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let opened = self.opened.clone();
        let connecting = self.inner.call(dst);
        Box::pin(async move {
            let conn = connecting.await?;
            opened.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("connection opened");
            Ok(conn)
        })
    }
}
