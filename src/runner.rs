use chrono::Local;
use hyper::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::check::{
    truncate_snippet, CheckOutcome, CheckSpec, ErrorKind, FailureRecord, Method, ParsedBody,
};
use crate::client;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Preview deployment the suite targets when no other base URL is given.
pub const DEFAULT_BASE_URL: &str = "http://golden-gate-treats.preview.emergentagent.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Orchestrates the fixed suite of bakery API checks: issues each request
/// sequentially, tallies pass/fail counts, and keeps a record per failure.
pub struct SmokeRunner {
    base_url: Url,
    api_url: Url,
    timeout: Duration,
    validation_status: StatusCode,
    tests_run: u32,
    tests_passed: u32,
    failures: Vec<FailureRecord>,
}

impl SmokeRunner {
    /// The client speaks plain HTTP/1.1, so only `http` base URLs are
    /// accepted; anything else fails here, before any request is sent.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.scheme() != "http" {
            return Err(format!("unsupported URL scheme: {}", base_url.scheme()).into());
        }
        if base_url.host_str().is_none() {
            return Err("base URL has no host".into());
        }
        let api_url = derive_api_url(&base_url)?;

        Ok(Self {
            base_url,
            api_url,
            timeout: DEFAULT_TIMEOUT,
            validation_status: StatusCode::UNPROCESSABLE_ENTITY,
            tests_run: 0,
            tests_passed: 0,
            failures: Vec::new(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Status the API is expected to answer invalid contact input with.
    /// This depends on the server's validation layer, hence overridable.
    pub fn with_validation_status(mut self, status: StatusCode) -> Self {
        self.validation_status = status;
        self
    }

    pub fn tests_run(&self) -> u32 {
        self.tests_run
    }

    pub fn tests_passed(&self) -> u32 {
        self.tests_passed
    }

    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Clears counters and failure records so the runner can drive a fresh
    /// run without cross-run leakage.
    pub fn reset(&mut self) {
        self.tests_run = 0;
        self.tests_passed = 0;
        self.failures.clear();
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        if endpoint.is_empty() {
            return Ok(self.api_url.clone());
        }
        Ok(Url::parse(&format!("{}/{}", self.api_url, endpoint))?)
    }

    /// Runs one check: exactly one request, compared against the expected
    /// status. Every failure is captured as a record; nothing propagates.
    pub async fn run_check(&mut self, spec: &CheckSpec) -> CheckOutcome {
        self.tests_run += 1;

        println!();
        println!("Testing {}...", spec.name);

        let url = match self.endpoint_url(&spec.endpoint) {
            Ok(url) => url,
            Err(err) => {
                let message = format!("Error: could not build URL: {err}");
                println!("   Failed - {message}");
                self.failures
                    .push(FailureRecord::error(&spec.name, ErrorKind::General, message));
                return CheckOutcome::failed();
            }
        };
        println!("   URL: {url}");
        log::debug!("{} {} expecting {}", spec.method, url, spec.expected.as_u16());

        let result = client::dispatch(
            &url,
            spec.method,
            spec.payload.as_ref(),
            spec.headers.as_deref(),
            self.timeout,
        )
        .await;

        match result {
            Ok((status, bytes)) => {
                if status == spec.expected {
                    self.tests_passed += 1;
                    let body = ParsedBody::from_bytes(&bytes);
                    println!("   Passed - Status: {}", status.as_u16());
                    let snippet = body.snippet();
                    if !snippet.is_empty() {
                        println!("   Response: {snippet}");
                    }
                    CheckOutcome { passed: true, body }
                } else {
                    let snippet = truncate_snippet(&String::from_utf8_lossy(&bytes));
                    println!(
                        "   Failed - Expected {}, got {}",
                        spec.expected.as_u16(),
                        status.as_u16()
                    );
                    if !snippet.is_empty() {
                        println!("   Response: {snippet}");
                    }
                    self.failures
                        .push(FailureRecord::mismatch(&spec.name, spec.expected, status, snippet));
                    CheckOutcome::failed()
                }
            }
            Err(err) => {
                let message = err.to_string();
                println!("   Failed - {message}");
                self.failures
                    .push(FailureRecord::error(&spec.name, err.kind(), message));
                CheckOutcome::failed()
            }
        }
    }

    pub async fn check_api_root(&mut self) -> bool {
        let spec = CheckSpec::new("API Root", Method::Get, "", StatusCode::OK);
        self.run_check(&spec).await.passed
    }

    pub async fn check_create_status_check(&mut self) -> (bool, Option<String>) {
        let payload = json!({
            "client_name": format!("test_client_{}", Local::now().format("%H%M%S")),
        });
        let spec = CheckSpec::new("Create Status Check", Method::Post, "status", StatusCode::OK)
            .with_payload(payload);
        let outcome = self.run_check(&spec).await;
        let id = extract_id(&outcome);
        (outcome.passed, id)
    }

    pub async fn check_get_status_checks(&mut self) -> bool {
        let spec = CheckSpec::new("Get Status Checks", Method::Get, "status", StatusCode::OK);
        self.run_check(&spec).await.passed
    }

    pub async fn check_create_contact_message(&mut self) -> (bool, Option<String>) {
        let payload = json!({
            "name": "Test Customer",
            "email": "test@example.com",
            "message": "This is a test message from the automated test suite.",
        });
        let spec = CheckSpec::new(
            "Create Contact Message",
            Method::Post,
            "contact",
            StatusCode::OK,
        )
        .with_payload(payload);
        let outcome = self.run_check(&spec).await;
        let id = extract_id(&outcome);
        (outcome.passed, id)
    }

    pub async fn check_get_contact_messages(&mut self) -> bool {
        let spec = CheckSpec::new("Get Contact Messages", Method::Get, "contact", StatusCode::OK);
        self.run_check(&spec).await.passed
    }

    pub async fn check_contact_form_validation(&mut self) -> bool {
        let payload = json!({
            "name": "",
            "email": "invalid-email",
            "message": "",
        });
        let spec = CheckSpec::new(
            "Contact Form Validation (Invalid Email)",
            Method::Post,
            "contact",
            self.validation_status,
        )
        .with_payload(payload);
        self.run_check(&spec).await.passed
    }

    /// Runs the six checks in fixed order, never short-circuiting, then
    /// prints the summary. Returns true iff every check passed.
    pub async fn run_all(&mut self) -> bool {
        println!("Starting bakery API smoke checks against {}", self.base_url);
        println!("{}", "=".repeat(50));

        self.check_api_root().await;

        let (_, status_id) = self.check_create_status_check().await;
        if let Some(id) = status_id {
            log::debug!("created status check {id}");
        }
        self.check_get_status_checks().await;

        let (_, contact_id) = self.check_create_contact_message().await;
        if let Some(id) = contact_id {
            log::debug!("created contact message {id}");
        }
        self.check_get_contact_messages().await;

        self.check_contact_form_validation().await;

        self.print_summary();
        self.tests_passed == self.tests_run
    }

    fn print_summary(&self) {
        println!();
        println!("{}", "=".repeat(50));
        println!("Test Summary:");
        println!("   Tests Run: {}", self.tests_run);
        println!("   Tests Passed: {}", self.tests_passed);
        println!("   Tests Failed: {}", self.tests_run - self.tests_passed);
        if self.tests_run > 0 {
            let rate = f64::from(self.tests_passed) / f64::from(self.tests_run) * 100.0;
            println!("   Success Rate: {rate:.1}%");
        }

        if !self.failures.is_empty() {
            println!();
            println!("Failed Tests:");
            for failure in &self.failures {
                println!("   - {}: {}", failure.name, failure.detail);
            }
        }
    }
}

fn derive_api_url(base_url: &Url) -> Result<Url> {
    let trimmed = base_url.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{trimmed}/api"))?)
}

fn extract_id(outcome: &CheckOutcome) -> Option<String> {
    if !outcome.passed {
        return None;
    }
    outcome
        .body
        .as_json()
        .and_then(|value| value.get("id"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}
