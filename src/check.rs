use hyper::StatusCode;
use serde_json::Value;
use std::fmt;

/// Characters of a response body kept for display and failure records.
pub const SNIPPET_LEN: usize = 200;

/// The only request methods the suite issues. Anything else is
/// unrepresentable, so no request can be sent with a bad method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_hyper(self) -> hyper::Method {
        match self {
            Method::Get => hyper::Method::GET,
            Method::Post => hyper::Method::POST,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// One named request/expectation pair.
#[derive(Debug, Clone)]
pub struct CheckSpec {
    pub name: String,
    pub method: Method,
    pub endpoint: String,
    pub expected: StatusCode,
    pub payload: Option<Value>,
    pub headers: Option<Vec<(String, String)>>,
}

impl CheckSpec {
    pub fn new(name: &str, method: Method, endpoint: &str, expected: StatusCode) -> Self {
        Self {
            name: name.to_owned(),
            method,
            endpoint: endpoint.to_owned(),
            expected,
            payload: None,
            headers: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Response body as parsed for display. Only `Json` carries data a caller
/// may read fields from; `Raw` keeps non-JSON text for display only.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(Value),
    Raw(String),
    Empty,
}

impl ParsedBody {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return ParsedBody::Empty;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => ParsedBody::Json(value),
            Err(_) => ParsedBody::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParsedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Text shown after a check, truncated to `SNIPPET_LEN`.
    pub fn snippet(&self) -> String {
        match self {
            ParsedBody::Json(value) => {
                truncate_snippet(&serde_json::to_string_pretty(value).unwrap_or_default())
            }
            ParsedBody::Raw(text) => truncate_snippet(text),
            ParsedBody::Empty => String::new(),
        }
    }
}

/// What a single check invocation hands back to its caller.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub passed: bool,
    pub body: ParsedBody,
}

impl CheckOutcome {
    pub fn failed() -> Self {
        Self {
            passed: false,
            body: ParsedBody::Empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    General,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::General => write!(f, "general"),
        }
    }
}

/// Structured capture of a single failed check.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub name: String,
    pub detail: FailureDetail,
}

/// A check fails either with a response carrying the wrong status or with
/// an error before a response was read, never both.
#[derive(Debug, Clone)]
pub enum FailureDetail {
    StatusMismatch {
        expected: StatusCode,
        actual: StatusCode,
        snippet: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl FailureRecord {
    pub fn mismatch(name: &str, expected: StatusCode, actual: StatusCode, snippet: String) -> Self {
        Self {
            name: name.to_owned(),
            detail: FailureDetail::StatusMismatch {
                expected,
                actual,
                snippet,
            },
        }
    }

    pub fn error(name: &str, kind: ErrorKind, message: String) -> Self {
        Self {
            name: name.to_owned(),
            detail: FailureDetail::Error { kind, message },
        }
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureDetail::StatusMismatch {
                expected, actual, ..
            } => {
                write!(f, "Expected {}, got {}", expected.as_u16(), actual.as_u16())
            }
            FailureDetail::Error { message, .. } => write!(f, "{message}"),
        }
    }
}

pub fn truncate_snippet(text: &str) -> String {
    text.chars().take(SNIPPET_LEN).collect()
}
