//! HTTP transport implementation
//!
//! Provides an HTTP client that implements the Transport trait.
//! Every request is bounded by the configured timeout; nothing is retried.

pub mod client;

pub use client::{HttpTransport, HttpTransportConfig};
