//! Configuration validation.
//!
//! Serde handles syntax; this checks meaning. Every problem is reported,
//! not just the first.

use reqwest::header::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("api.origin_header: '{0}' is not a valid header name")]
    InvalidHeaderName(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("{field}: '{value}' must start with '/'")]
    RelativePath { field: &'static str, value: String },

    #[error("observability.log_format: unknown format '{0}'")]
    UnknownLogFormat(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url("api.base_url", &config.api.base_url, &mut errors);
    if let Some(auth_base) = &config.api.auth_base_url {
        check_url("api.auth_base_url", auth_base, &mut errors);
    }

    if HeaderName::from_bytes(config.api.origin_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            config.api.origin_header.clone(),
        ));
    }
    if config.api.app_origin.trim().is_empty() {
        errors.push(ValidationError::Empty("api.app_origin"));
    }

    check_path("auth.login_path", &config.auth.login_path, &mut errors);
    check_path("auth.refresh_path", &config.auth.refresh_path, &mut errors);
    for endpoint in &config.auth.public_endpoints {
        check_path("auth.public_endpoints", endpoint, &mut errors);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if config.listing.page_param.is_empty() {
        errors.push(ValidationError::Empty("listing.page_param"));
    }
    if config.listing.search_param.is_empty() {
        errors.push(ValidationError::Empty("listing.search_param"));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(
            config.observability.log_format.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let ok = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_path(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if !value.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            field,
            value: value.to_string(),
        });
    }
}
