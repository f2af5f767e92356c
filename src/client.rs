use bytes::Bytes;
use http::request::Request;
use http_body_util::{BodyExt, Full};
use hyper::{body::Buf, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;
use url::Url;

use crate::check::{ErrorKind, Method};

/// Failure of a single dispatch, classified the way the summary reports
/// it: transport problems (connect, timeout, broken response) are network
/// errors, everything before the wire is general.
#[derive(Debug)]
pub enum DispatchError {
    Network(String),
    General(String),
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Network(_) => ErrorKind::Network,
            DispatchError::General(_) => ErrorKind::General,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Network(message) => write!(f, "Network Error: {message}"),
            DispatchError::General(message) => write!(f, "Error: {message}"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Sends exactly one request and reads the full response body. The whole
/// exchange, connect included, runs under `limit`.
pub async fn dispatch(
    url: &Url,
    method: Method,
    payload: Option<&Value>,
    headers: Option<&[(String, String)]>,
    limit: Duration,
) -> Result<(StatusCode, Bytes), DispatchError> {
    let req = build_request(url, method, payload, headers)?;

    match tokio::time::timeout(limit, send(url, req)).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::Network(format!(
            "request timed out after {:.1}s",
            limit.as_secs_f64()
        ))),
    }
}

fn build_request(
    url: &Url,
    method: Method,
    payload: Option<&Value>,
    headers: Option<&[(String, String)]>,
) -> Result<Request<Full<Bytes>>, DispatchError> {
    let body = match (method, payload) {
        (Method::Post, Some(data)) => {
            let encoded = serde_json::to_vec(data).map_err(|err| {
                DispatchError::General(format!("could not encode payload: {err}"))
            })?;
            Full::new(Bytes::from(encoded))
        }
        _ => Full::new(Bytes::new()),
    };

    let host = url
        .host_str()
        .ok_or_else(|| DispatchError::General("URL has no host".to_owned()))?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };

    let mut builder = Request::builder()
        .method(method.as_hyper())
        .uri(url.as_str())
        .header(hyper::header::HOST, authority);

    match headers {
        Some(extra) => {
            for (name, value) in extra {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        None => {
            builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
        }
    }

    builder
        .body(body)
        .map_err(|err| DispatchError::General(format!("could not build request: {err}")))
}

async fn send(
    url: &Url,
    req: Request<Full<Bytes>>,
) -> Result<(StatusCode, Bytes), DispatchError> {
    let host = url
        .host_str()
        .ok_or_else(|| DispatchError::General("URL has no host".to_owned()))?;
    let port = url.port_or_known_default().unwrap_or(80);
    let addr = format!("{}:{}", host, port);

    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|err| DispatchError::Network(format!("could not connect to {addr}: {err}")))?;

    let (mut sender, conn) = hyper::client::conn::http1::handshake(stream)
        .await
        .map_err(|err| DispatchError::Network(format!("handshake with {addr} failed: {err}")))?;
    tokio::task::spawn(async move {
        if let Err(err) = conn.await {
            log::debug!("connection closed with error: {err}");
        }
    });

    let res = sender
        .send_request(req)
        .await
        .map_err(|err| DispatchError::Network(format!("request to {addr} failed: {err}")))?;
    let status = res.status().to_owned();

    let mut body = res
        .collect()
        .await
        .map_err(|err| DispatchError::Network(format!("could not read response body: {err}")))?
        .aggregate();
    let bytes = body.copy_to_bytes(body.remaining());

    Ok((status, bytes))
}
