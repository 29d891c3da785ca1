//! Stored Response Module
//!
//! A response snapshot as kept inside a cache partition.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

// == Stored Response ==
/// Status, content type and body of a fetched or synthesized response.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    /// HTTP status code
    pub status: u16,
    /// Value of the Content-Type header
    pub content_type: String,
    /// Response body
    pub body: Bytes,
    /// Time the response was stored (Unix milliseconds)
    pub stored_at: i64,
    /// Redirect target sent as the Location header
    pub location: Option<String>,
}

impl StoredResponse {
    // == Constructor ==
    /// Creates a response snapshot stamped with the current time.
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
            stored_at: chrono::Utc::now().timestamp_millis(),
            location: None,
        }
    }

    /// 307 pointing the client at another URL.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::new(307, "text/plain; charset=utf-8", Bytes::new())
        }
    }

    /// 200 response with the given body.
    pub fn ok(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(200, content_type, body)
    }

    /// Empty 404 response.
    pub fn not_found() -> Self {
        Self::new(404, "text/plain; charset=utf-8", Bytes::new())
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl IntoResponse for StoredResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = (status, Body::from(self.body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&self.content_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        if let Some(value) = self.location.and_then(|l| HeaderValue::from_str(&l).ok()) {
            response.headers_mut().insert(header::LOCATION, value);
        }
        response
    }
}
