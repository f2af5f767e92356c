use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Buf;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

/// Knobs for misbehaving-server scenarios. The default behavior is a
/// healthy bakery API: 200s everywhere and 422 for invalid contact input.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBehavior {
    /// Status forced for a well-formed contact create (e.g. 500).
    pub contact_create_status: Option<u16>,
    /// Status answered for invalid contact input instead of 422.
    pub invalid_contact_status: Option<u16>,
    /// Delay before answering the API root, to trip the client timeout.
    pub root_delay: Option<Duration>,
}

/// In-process stand-in for the bakery API server.
pub struct MockApi {
    addr: SocketAddr,
}

impl MockApi {
    pub async fn start(behavior: MockBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock listener addr");

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                tokio::spawn(async move {
                    let service = service_fn(move |req| handle(req, behavior));
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(stream, service)
                        .await;
                });
            }
        });

        Self { addr }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

#[derive(Deserialize)]
struct ContactPayload {
    name: String,
    email: String,
    message: String,
}

async fn handle<B>(
    req: Request<B>,
    behavior: MockBehavior,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body,
{
    let (parts, body) = req.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => {
            let mut buf = collected.aggregate();
            buf.copy_to_bytes(buf.remaining())
        }
        Err(_) => Bytes::new(),
    };

    if parts.method == hyper::Method::GET && parts.uri.path() == "/api" {
        if let Some(delay) = behavior.root_delay {
            sleep(delay).await;
        }
    }

    let (status, payload) = route(parts.method.as_str(), parts.uri.path(), &bytes, behavior);

    let response = Response::builder()
        .status(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(payload.to_string())))
        .expect("mock response");

    Ok(response)
}

fn route(method: &str, path: &str, body: &Bytes, behavior: MockBehavior) -> (u16, Value) {
    match (method, path) {
        ("GET", "/api") => (200, json!({"message": "Bakery API ready"})),
        ("POST", "/api/status") => create_status_check(body),
        ("GET", "/api/status") => (
            200,
            json!([{"id": "status-1", "client_name": "test_client_000000"}]),
        ),
        ("POST", "/api/contact") => create_contact(body, behavior),
        ("GET", "/api/contact") => (200, json!([])),
        _ => (404, json!({"detail": "Not Found"})),
    }
}

fn create_status_check(body: &Bytes) -> (u16, Value) {
    let payload: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let client_name = payload
        .get("client_name")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_owned();
    (200, json!({"id": "status-1", "client_name": client_name}))
}

fn create_contact(body: &Bytes, behavior: MockBehavior) -> (u16, Value) {
    let invalid_status = behavior.invalid_contact_status.unwrap_or(422);

    let payload: ContactPayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(_) => return (invalid_status, json!({"detail": "invalid body"})),
    };

    if payload.name.is_empty() || payload.message.is_empty() || !payload.email.contains('@') {
        return (
            invalid_status,
            json!({"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address"}]}),
        );
    }

    if let Some(forced) = behavior.contact_create_status {
        return (forced, json!({"detail": "internal error"}));
    }

    (
        200,
        json!({
            "id": "contact-1",
            "name": payload.name,
            "email": payload.email,
            "message": payload.message,
        }),
    )
}
