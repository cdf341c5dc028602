//! HTTP API tests: a real server on a loopback port, driven with ureq.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::oneshot;

use huddle::web_client::{router::build_router, state};
use huddle::{Chat, ManualClock};

async fn start_server() -> (String, oneshot::Sender<()>) {
    let chat = Chat::open_in_memory(Arc::new(ManualClock::default())).unwrap();
    let app = build_router(state::shared(chat));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind server");
    let addr = listener.local_addr().expect("local addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });
    (format!("http://{addr}"), shutdown_tx)
}

fn call(method: &str, url: &str, token: Option<&str>, body: Option<Value>) -> (u16, Value) {
    let mut req = ureq::request(method, url);
    if let Some(token) = token {
        req = req.set("Authorization", &format!("Bearer {token}"));
    }
    let result = match body {
        Some(body) => req.send_json(body),
        None => req.call(),
    };
    match result {
        Ok(r) => {
            let status = r.status();
            (status, r.into_json().unwrap_or(Value::Null))
        }
        Err(ureq::Error::Status(code, r)) => (code, r.into_json().unwrap_or(Value::Null)),
        Err(e) => panic!("request failed: {e}"),
    }
}

async fn request(
    method: &'static str,
    url: String,
    token: Option<&'static str>,
    body: Option<Value>,
) -> (u16, Value) {
    tokio::task::spawn_blocking(move || call(method, &url, token, body))
        .await
        .unwrap()
}

async fn sync_user(base: &str, token: &'static str, name: &str) -> i64 {
    let (status, body) = request(
        "POST",
        format!("{base}/api/users/sync"),
        Some(token),
        Some(json!({ "display_name": name, "email": format!("{token}@example.com") })),
    )
    .await;
    assert_eq!(status, 200);
    body["user_id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, shutdown_tx) = start_server().await;
    let (status, body) = request("GET", format!("{base}/api/health"), None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["users"], 0);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn direct_chat_over_http() {
    let (base, shutdown_tx) = start_server().await;
    sync_user(&base, "tok-a", "Alice").await;
    let bob = sync_user(&base, "tok-b", "Bob").await;

    let (status, body) = request(
        "POST",
        format!("{base}/api/conversations/direct"),
        Some("tok-a"),
        Some(json!({ "other_user_id": bob })),
    )
    .await;
    assert_eq!(status, 200);
    let conv = body["conversation_id"].as_i64().unwrap();

    let (status, body) = request(
        "POST",
        format!("{base}/api/conversations/{conv}/messages"),
        Some("tok-a"),
        Some(json!({ "content": "hello bob" })),
    )
    .await;
    assert_eq!(status, 201);
    let msg = body["message_id"].as_i64().unwrap();

    let (status, body) = request(
        "GET",
        format!("{base}/api/conversations"),
        Some("tok-b"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["id"], conv);
    assert_eq!(body[0]["unread_count"], 1);
    assert_eq!(body[0]["other_user"]["display_name"], "Alice");

    let (status, body) = request(
        "POST",
        format!("{base}/api/conversations/{conv}/read"),
        Some("tok-b"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["marked"], 1);

    let (status, body) = request(
        "POST",
        format!("{base}/api/messages/{msg}/reactions"),
        Some("tok-b"),
        Some(json!({ "emoji": "👍" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["reacted"], true);

    let (status, body) = request(
        "GET",
        format!("{base}/api/conversations/{conv}/messages"),
        Some("tok-a"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["content"], "hello bob");
    assert_eq!(body[0]["is_me"], true);
    assert_eq!(body[0]["read_count"], 1);
    assert_eq!(body[0]["reactions"][0]["emoji"], "👍");
    assert_eq!(body[0]["reactions"][0]["has_reacted"], false);

    let (status, _) = request(
        "DELETE",
        format!("{base}/api/messages/{msg}"),
        Some("tok-b"),
        None,
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = request(
        "POST",
        format!("{base}/api/messages/delete"),
        Some("tok-a"),
        Some(json!({ "message_ids": [msg] })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["deleted"], 1);

    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let (base, shutdown_tx) = start_server().await;
    let alice = sync_user(&base, "tok-a", "Alice").await;

    let (status, body) = request(
        "POST",
        format!("{base}/api/conversations/direct"),
        None,
        Some(json!({ "other_user_id": alice })),
    )
    .await;
    assert_eq!(status, 401);
    assert!(body["error"].is_string());

    let (status, _) = request(
        "POST",
        format!("{base}/api/conversations/direct"),
        Some("tok-a"),
        Some(json!({ "other_user_id": alice })),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = request(
        "POST",
        format!("{base}/api/conversations/direct"),
        Some("tok-a"),
        Some(json!({ "other_user_id": 4_040 })),
    )
    .await;
    assert_eq!(status, 404);

    let (status, body) = request("GET", format!("{base}/api/users"), None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));

    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn group_governance_over_http() {
    let (base, shutdown_tx) = start_server().await;
    sync_user(&base, "tok-a", "Alice").await;
    let bob = sync_user(&base, "tok-b", "Bob").await;
    let carol = sync_user(&base, "tok-c", "Carol").await;

    let (status, body) = request(
        "POST",
        format!("{base}/api/groups"),
        Some("tok-a"),
        Some(json!({ "name": "team", "member_ids": [bob] })),
    )
    .await;
    assert_eq!(status, 201);
    let conv = body["conversation_id"].as_i64().unwrap();

    let (status, _) = request(
        "POST",
        format!("{base}/api/groups/{conv}/members"),
        Some("tok-b"),
        Some(json!({ "user_id": carol })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = request(
        "POST",
        format!("{base}/api/groups/{conv}/members"),
        Some("tok-a"),
        Some(json!({ "user_id": bob })),
    )
    .await;
    assert_eq!(status, 409);

    let (status, _) = request(
        "POST",
        format!("{base}/api/groups/{conv}/members"),
        Some("tok-a"),
        Some(json!({ "user_id": carol })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = request(
        "PUT",
        format!("{base}/api/groups/{conv}/name"),
        Some("tok-a"),
        Some(json!({ "name": "dream team" })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = request(
        "POST",
        format!("{base}/api/groups/{conv}/admins"),
        Some("tok-a"),
        Some(json!({ "user_id": bob })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = request(
        "DELETE",
        format!("{base}/api/groups/{conv}/members/{carol}"),
        Some("tok-b"),
        None,
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = request(
        "GET",
        format!("{base}/api/groups/{conv}"),
        Some("tok-b"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["group_name"], "dream team");
    assert_eq!(body["am_i_admin"], true);
    assert_eq!(body["needs_admin_claim"], false);
    assert_eq!(body["members"].as_array().unwrap().len(), 2);

    let (status, _) = request(
        "GET",
        format!("{base}/api/groups/{conv}"),
        Some("tok-c"),
        None,
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = request(
        "DELETE",
        format!("{base}/api/groups/{conv}/admins/{bob}"),
        Some("tok-a"),
        None,
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = request(
        "POST",
        format!("{base}/api/groups/{conv}/claim-admin"),
        Some("tok-a"),
        None,
    )
    .await;
    assert_eq!(status, 403);

    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn typing_and_presence_over_http() {
    let (base, shutdown_tx) = start_server().await;
    sync_user(&base, "tok-a", "Alice").await;
    let bob = sync_user(&base, "tok-b", "Bob").await;

    let (_, body) = request(
        "POST",
        format!("{base}/api/conversations/direct"),
        Some("tok-a"),
        Some(json!({ "other_user_id": bob })),
    )
    .await;
    let conv = body["conversation_id"].as_i64().unwrap();

    let (status, _) = request(
        "POST",
        format!("{base}/api/conversations/{conv}/typing"),
        Some("tok-b"),
        Some(json!({ "is_typing": true })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = request(
        "GET",
        format!("{base}/api/conversations/{conv}/typing"),
        Some("tok-a"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["id"], bob);

    let (status, _) = request(
        "POST",
        format!("{base}/api/users/online"),
        Some("tok-b"),
        Some(json!({ "is_online": false })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = request(
        "GET",
        format!("{base}/api/users?search=bo"),
        Some("tok-a"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["id"], bob);
    assert_eq!(body[0]["is_online"], false);

    shutdown_tx.send(()).ok();
}
