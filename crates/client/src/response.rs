use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use trekdesk_core::errors::ApiError;
use trekdesk_core::Package;

/// How a non-success status is reported for one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection<'a> {
    /// 404 means the named record does not exist.
    Lookup { resource: &'static str, id: &'a str },
    /// Any client error is the offer service refusing the code.
    Coupon,
    Generic,
}

pub fn status_error(status: StatusCode, body: &str, rejection: Rejection<'_>) -> ApiError {
    let code = status.as_u16();
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        return ApiError::ServiceUnavailable { status: code };
    }

    let message = error_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    match (rejection, status) {
        (Rejection::Coupon, _) => ApiError::invalid_coupon(message),
        (Rejection::Lookup { resource, id }, StatusCode::NOT_FOUND) => {
            ApiError::not_found(resource, id)
        }
        _ => ApiError::Rejected { status: code, message },
    }
}

/// Pulls a human-readable message out of `{ "message" }`, `{ "error" }` or
/// `{ "error": { "message" } }` bodies.
pub fn error_message(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    let candidate = payload
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| payload.get("error").and_then(Value::as_str))
        .or_else(|| payload.pointer("/error/message").and_then(Value::as_str))?;
    let trimmed = candidate.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|error| ApiError::Decode(error.to_string()))
}

/// Single-record endpoints answer either with the record or with `{ "data": record }`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum FavoritesPayload {
    List(Vec<Package>),
    Wrapped { data: Vec<Package> },
}

impl FavoritesPayload {
    pub fn into_packages(self) -> Vec<Package> {
        match self {
            Self::List(packages) | Self::Wrapped { data: packages } => packages,
        }
    }
}
