//! Bot API response envelope and failure mapping

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, Result};

/// `{ ok, result, description, error_code }` wrapper around every response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<u16>,
}

/// Decode a raw response body for `method`.
///
/// `status` is the HTTP status, used when the body carries no error code.
pub fn decode<T: DeserializeOwned>(method: &str, status: u16, body: &str) -> Result<T> {
    let envelope: ApiResponse<T> = serde_json::from_str(body).map_err(|e| {
        Error::transport(format!(
            "{}: undecodable response (HTTP {}): {}",
            method, status, e
        ))
    })?;

    if envelope.ok {
        return envelope
            .result
            .ok_or_else(|| Error::transport(format!("{}: response without result", method)));
    }

    let code = envelope.error_code.unwrap_or(status);
    let message = envelope
        .description
        .unwrap_or_else(|| "Unknown error".to_string());
    Err(classify(method, code, message))
}

/// Caller mistakes become [`Error::InvalidRequest`]; a bad token, unknown
/// endpoint, throttling or server fault is a transport problem.
pub fn classify(method: &str, code: u16, message: String) -> Error {
    match code {
        401 | 403 | 404 | 429 => Error::transport(format!("{}: {} {}", method, code, message)),
        400..=499 => Error::InvalidRequest { code, message },
        _ => Error::transport(format!("{}: {} {}", method, code, message)),
    }
}
