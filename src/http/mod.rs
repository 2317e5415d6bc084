//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! ApiRequest (request.rs)
//!     → client.rs (resolve URL, token gate, decorate headers)
//!     → reqwest send (under the request's CancelToken)
//!     → 2xx: response.rs decodes JSON
//!     → 401/403: auth policy → single-flight refresh → replay once
//!     → other: response.rs builds ClientError::Http for the caller
//! ```

pub mod client;
pub mod request;
pub mod response;

pub use client::ApiClient;
pub use request::{endpoint_url, ApiRequest, X_REQUEST_ID};
