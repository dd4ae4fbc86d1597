//! Transport capabilities for plugswap
//!
//! Provides the two capabilities the update pipeline needs but does not
//! implement itself:
//!
//! - **Transport trait**: generic request/response interface, with an HTTP
//!   implementation via reqwest
//! - **ProcessInvoker trait**: run an external tool to completion or launch
//!   it detached, with a tokio implementation
//! - **Error handling**: one error type shared by both capabilities
//!
//! # Usage
//!
//! ```ignore
//! use plugswap_transport::{HttpRequest, HttpTransport, Transport};
//!
//! let transport = HttpTransport::new()?;
//! let request = HttpRequest::new("GET", "http://localhost:8080/login");
//! let response = transport.send_http(request).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod subprocess;
pub mod traits;

// Re-export commonly used types
pub use error::{Result, TransportError};
pub use http::{HttpTransport, HttpTransportConfig};
pub use subprocess::{ProcessConfig, ProcessInvoker, ProcessOutput, SystemProcessInvoker};
pub use traits::{HttpRequest, HttpResponse, Transport};
