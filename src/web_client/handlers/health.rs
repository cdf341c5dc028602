//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::web_client::state::SharedState;
use crate::web_client::utils::api_error;

pub async fn health_handler(State(state): State<SharedState>) -> Response {
    let st = state.lock().await;
    match st.chat.storage().list_users() {
        Ok(users) => {
            let body = serde_json::json!({
                "status": "ok",
                "users": users.len(),
            });
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
