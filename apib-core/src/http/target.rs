use std::str::FromStr as _;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Request, Uri};
use http_body_util::Full;

use super::estimate::estimate_request_bytes;
use super::{Error, Result};

const USER_AGENT: &str = concat!("apib/", env!("CARGO_PKG_VERSION"));

/// The one fixed request a run sends over and over.
///
/// Everything is parsed and validated up front so a bad URL or header is a
/// configuration error, never a per-attempt failure.
#[derive(Debug, Clone)]
pub struct Target {
    url: String,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    bytes_sent: u64,
}

impl Target {
    /// Parse a target. `method` defaults to POST when a body is present, GET otherwise.
    /// Headers are `name:value` strings.
    pub fn new(url: &str, method: Option<&str>, headers: &[String], body: Bytes) -> Result<Self> {
        let parsed = url::Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::UnsupportedScheme {
                scheme: parsed.scheme().to_string(),
                url: url.to_string(),
            });
        }
        let host = host_header_value(&parsed).ok_or_else(|| Error::InvalidUrl(url.to_string()))?;

        let uri: Uri = parsed
            .as_str()
            .parse()
            .map_err(|_| Error::InvalidUrl(url.to_string()))?;

        let method = match method {
            Some(m) => Method::from_str(m).map_err(|_| Error::InvalidMethod(m.to_string()))?,
            None if body.is_empty() => Method::GET,
            None => Method::POST,
        };

        let mut header_map = HeaderMap::new();
        header_map.insert(http::header::HOST, HeaderValue::from_str(&host)?);
        header_map.insert(
            http::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        if !body.is_empty() {
            header_map.insert(http::header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }
        for raw in headers {
            let (name, value) = parse_header(raw)?;
            header_map.insert(name, value);
        }

        let bytes_sent = estimate_request_bytes(&method, &uri, &header_map, body.len() as u64);

        Ok(Self {
            url: url.to_string(),
            method,
            uri,
            headers: header_map,
            body,
            bytes_sent,
        })
    }

    pub fn get(url: &str) -> Result<Self> {
        Self::new(url, None, &[], Bytes::new())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Estimated wire size of one request (HTTP/1.1 request line + headers + body).
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Build a fresh request. Cloning `Bytes` and the header map is cheap relative to a round trip.
    pub fn request(&self) -> Request<Full<Bytes>> {
        let mut req = Request::new(Full::new(self.body.clone()));
        *req.method_mut() = self.method.clone();
        *req.uri_mut() = self.uri.clone();
        *req.headers_mut() = self.headers.clone();
        req
    }
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| Error::InvalidHeader(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidHeader(raw.to_string()));
    }

    let name = HeaderName::from_bytes(name.as_bytes())?;
    let value = HeaderValue::from_str(value.trim())?;
    Ok((name, value))
}

fn host_header_value(parsed: &url::Url) -> Option<String> {
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn method_defaults_depend_on_body() {
        let get = Target::get("http://localhost:8080/hello")
            .unwrap_or_else(|err| panic!("valid target: {err}"));
        assert_eq!(*get.method(), Method::GET);

        let post = Target::new(
            "http://localhost:8080/echo",
            None,
            &[],
            Bytes::from_static(b"ping"),
        )
        .unwrap_or_else(|err| panic!("valid target: {err}"));
        assert_eq!(*post.method(), Method::POST);
        assert_eq!(
            post.headers()
                .get(http::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok()),
            Some("4")
        );
    }

    #[test]
    fn host_header_keeps_explicit_port() {
        let t = Target::get("http://127.0.0.1:9000/").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(
            t.headers().get(http::header::HOST).and_then(|v| v.to_str().ok()),
            Some("127.0.0.1:9000")
        );

        let t = Target::get("https://example.com/x").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(
            t.headers().get(http::header::HOST).and_then(|v| v.to_str().ok()),
            Some("example.com")
        );
    }

    #[test]
    fn extra_headers_are_parsed_and_override_defaults() {
        let t = Target::new(
            "http://localhost/",
            Some("PUT"),
            &["x-test: 1".to_string(), "User-Agent:custom".to_string()],
            Bytes::new(),
        )
        .unwrap_or_else(|err| panic!("{err}"));

        assert_eq!(*t.method(), Method::PUT);
        assert_eq!(
            t.headers().get("x-test").and_then(|v| v.to_str().ok()),
            Some("1")
        );
        assert_eq!(
            t.headers()
                .get(http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok()),
            Some("custom")
        );
    }

    #[test]
    fn invalid_targets_are_configuration_errors() {
        let cases = [
            Target::get("not a url"),
            Target::get("ftp://localhost/file"),
            Target::new("http://localhost/", Some("GE T"), &[], Bytes::new()),
            Target::new(
                "http://localhost/",
                None,
                &["missing-colon".to_string()],
                Bytes::new(),
            ),
        ];

        for res in cases {
            match res {
                Ok(t) => panic!("expected configuration error for {}", t.url()),
                Err(err) => assert_eq!(err.kind(), ErrorKind::Configuration, "{err}"),
            }
        }
    }

    #[test]
    fn request_carries_template_fields() {
        let t = Target::new(
            "http://localhost:1234/echo?x=1",
            None,
            &[],
            Bytes::from_static(b"hello"),
        )
        .unwrap_or_else(|err| panic!("{err}"));

        let req = t.request();
        assert_eq!(*req.method(), Method::POST);
        assert_eq!(req.uri().path(), "/echo");
        assert_eq!(req.uri().query(), Some("x=1"));
        assert_eq!(req.headers().len(), t.headers().len());
        assert!(t.bytes_sent() > 5);
    }
}
