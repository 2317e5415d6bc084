//! Back-office REST client library.
//!
//! An authenticated HTTP client for admin back-office APIs (card/payment
//! administration, POS back-office) with transparent single-flight token
//! refresh, plus the remote list/select helpers the screens are built on.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod listing;
pub mod observability;
pub mod session;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{ApiClient, ApiRequest};
pub use session::{Session, SessionStore};
