//! Fetch Interception
//!
//! Router fallback: every request that is not an API route goes through the
//! asset worker. Absolute-form targets on another origin are redirected to
//! that origin, the rest are answered cache-first.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::handlers::AppState;
use crate::error::Result;

/// Response header naming where an intercepted request was answered from.
pub const SERVED_FROM_HEADER: &str = "x-served-from";

/// Fallback handler for all non-API requests.
pub async fn fetch_handler(State(state): State<AppState>, req: Request) -> Result<Response> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let uri = req.uri();
    let target = if uri.scheme().is_some() {
        uri.to_string()
    } else {
        uri.path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string())
    };

    let url = state.worker.resolve(&target)?;
    let served = state.worker.handle_fetch(&url).await?;
    debug!("{} served from {}", url, served.from.as_str());

    let mut response = served.response.into_response();
    response.headers_mut().insert(
        SERVED_FROM_HEADER,
        HeaderValue::from_static(served.from.as_str()),
    );
    Ok(response)
}
