//! Response decoding and error extraction.

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{backend_message, ClientError, ClientResult};

/// Turn a non-success response into `ClientError::Http`, keeping the
/// backend's message and JSON body when it sent one.
pub async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let body = match response.bytes().await {
        Ok(bytes) if !bytes.is_empty() => serde_json::from_slice::<Value>(&bytes).ok(),
        _ => None,
    };
    let message = body
        .as_ref()
        .and_then(backend_message)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    ClientError::Http {
        status,
        message,
        body,
    }
}

/// Decode a success response body as JSON.
///
/// An empty body decodes as JSON `null`, so `()` and `Option<T>` targets
/// accept 204-style answers.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
