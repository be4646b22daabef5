use apib_testserver::{HELLO_BODY, TestServerStats, router};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use tower::ServiceExt as _;

async fn call(req: Request<Body>) -> anyhow::Result<(StatusCode, Vec<u8>, Option<String>)> {
    let resp = router(TestServerStats::default()).oneshot(req).await?;
    let status = resp.status();
    let ct = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok((status, body.to_vec(), ct))
}

fn get(uri: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::get(uri).body(Body::empty())?)
}

#[tokio::test]
async fn hello_returns_greeting() -> anyhow::Result<()> {
    let (status, body, _) = call(get("/hello")?).await?;
    anyhow::ensure!(status == StatusCode::OK, "status={status}");
    anyhow::ensure!(body == HELLO_BODY.as_bytes());
    Ok(())
}

#[tokio::test]
async fn root_and_help_are_text() -> anyhow::Result<()> {
    let (status, body, _) = call(get("/")?).await?;
    anyhow::ensure!(status == StatusCode::OK);
    anyhow::ensure!(String::from_utf8(body)?.contains("/help"));

    let (status, body, _) = call(get("/help")?).await?;
    anyhow::ensure!(status == StatusCode::OK);
    anyhow::ensure!(String::from_utf8(body)?.contains("/hello"));
    Ok(())
}

#[tokio::test]
async fn data_returns_requested_size() -> anyhow::Result<()> {
    let (status, body, _) = call(get("/data?size=1000")?).await?;
    anyhow::ensure!(status == StatusCode::OK);
    anyhow::ensure!(body.len() == 1000, "len={}", body.len());
    anyhow::ensure!(body.iter().all(|b| *b == b'a'));

    let (status, body, _) = call(get("/data?size=0")?).await?;
    anyhow::ensure!(status == StatusCode::OK);
    anyhow::ensure!(body.is_empty());

    let (status, body, _) = call(get("/data")?).await?;
    anyhow::ensure!(status == StatusCode::OK);
    anyhow::ensure!(body.is_empty());
    Ok(())
}

#[tokio::test]
async fn echo_returns_body_and_content_type() -> anyhow::Result<()> {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"ping":true}"#))?;

    let (status, body, ct) = call(req).await?;
    anyhow::ensure!(status == StatusCode::OK);
    anyhow::ensure!(body == br#"{"ping":true}"#);
    anyhow::ensure!(ct.as_deref() == Some("application/json"), "ct={ct:?}");
    Ok(())
}

#[tokio::test]
async fn unknown_path_and_wrong_method() -> anyhow::Result<()> {
    let (status, _, _) = call(get("/nope")?).await?;
    anyhow::ensure!(status == StatusCode::NOT_FOUND, "status={status}");

    let (status, _, _) = call(get("/echo")?).await?;
    anyhow::ensure!(status == StatusCode::METHOD_NOT_ALLOWED, "status={status}");

    let req = Request::post("/hello").body(Body::empty())?;
    let (status, _, _) = call(req).await?;
    anyhow::ensure!(status == StatusCode::METHOD_NOT_ALLOWED, "status={status}");
    Ok(())
}

#[tokio::test]
async fn server_counts_requests() -> anyhow::Result<()> {
    let server = apib_testserver::TestServer::start().await?;
    let addr = server.addr();

    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    let mut stream = tokio::net::TcpStream::connect(addr).await?;
    stream
        .write_all(b"GET /hello HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await?;
    let mut resp = Vec::new();
    stream.read_to_end(&mut resp).await?;

    let text = String::from_utf8_lossy(&resp);
    anyhow::ensure!(text.starts_with("HTTP/1.1 200"), "resp={text}");
    anyhow::ensure!(text.ends_with(HELLO_BODY), "resp={text}");
    anyhow::ensure!(server.stats().requests_total() == 1);

    server.shutdown().await;
    Ok(())
}
