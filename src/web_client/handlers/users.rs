//! Identity sync, presence and user search.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use crate::identity::Profile;
use crate::web_client::state::SharedState;
use crate::web_client::utils::{bearer_token, respond};

pub async fn sync_identity_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(profile): axum::Json<Profile>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .sync_identity(token.as_deref(), &profile)
            .map(|user_id| serde_json::json!({ "user_id": user_id })),
    )
}

#[derive(Deserialize)]
pub struct OnlineRequest {
    is_online: bool,
}

pub async fn set_online_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<OnlineRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .set_online_status(token.as_deref(), req.is_online)
            .map(|()| serde_json::json!({ "status": "ok" })),
    )
}

#[derive(Deserialize)]
pub struct SearchQuery {
    search: Option<String>,
}

pub async fn search_users_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<SearchQuery>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(st.chat.search_users(token.as_deref(), params.search.as_deref()))
}
