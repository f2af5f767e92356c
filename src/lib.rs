//! Smoke checks for the bakery website REST API.
//!
//! The crate drives a fixed suite of six HTTP checks (status endpoint,
//! contact form, API root) against a base URL, tallies pass/fail counts,
//! and prints a summary. The binary in `main.rs` maps the suite result to
//! the process exit code.

pub mod check;
pub mod client;
pub mod runner;
