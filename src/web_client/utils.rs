//! Shared utility functions for the web client.

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::{ChatError, ChatResult};

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, axum::Json(body)).into_response()
}

pub fn error_status(e: &ChatError) -> StatusCode {
    match e {
        ChatError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ChatError::NotFound(_) => StatusCode::NOT_FOUND,
        ChatError::Forbidden(_) => StatusCode::FORBIDDEN,
        ChatError::Conflict(_) => StatusCode::CONFLICT,
        ChatError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
        ChatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a failed operation to its JSON error response.
pub fn chat_error(e: ChatError) -> Response {
    let status = error_status(&e);
    if status.is_server_error() {
        tracing::error!("request failed: {e}");
    }
    api_error(status, e.to_string())
}

/// `200 OK` with `value` as JSON, or the mapped error.
pub fn respond<T: Serialize>(result: ChatResult<T>) -> Response {
    respond_with(StatusCode::OK, result)
}

pub fn respond_with<T: Serialize>(status: StatusCode, result: ChatResult<T>) -> Response {
    match result {
        Ok(value) => (status, axum::Json(value)).into_response(),
        Err(e) => chat_error(e),
    }
}

/// The identity token from `Authorization: Bearer <token>`, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok-1"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("tok-1"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_errors_map_to_statuses() {
        assert_eq!(error_status(&ChatError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            error_status(&ChatError::Conflict("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(&ChatError::InvalidOperation("x".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
