#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use murmur::ai::GatewayClient;
use murmur::api::AppState;
use murmur::config::{AiConfig, MurmurConfig};
use murmur::db;
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// App state over an in-memory db plus a token for `user`.
pub fn test_state(user: &str, ai: Option<GatewayClient>) -> (AppState, String) {
    let conn = test_db();
    let token = db::tokens::issue_token(&conn, user).unwrap();
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        ai: ai.map(Arc::new),
        config: Arc::new(MurmurConfig::default()),
    };
    (state, token)
}

pub async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn get_req(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

pub fn json_req(method: &str, uri: &str, body: serde_json::Value, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub const BOUNDARY: &str = "murmur-test-boundary";

/// A multipart body with a single field.
pub fn multipart_req(uri: &str, field: &str, mime: &str, data: &[u8], token: &str) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"note.bin\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

/// A fake chat-completions endpoint. Replies are handed out in order and the
/// last one repeats; every request body is recorded.
#[derive(Clone)]
pub struct MockGateway {
    pub url: String,
    pub requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    replies: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

async fn complete(
    State(mock): State<MockState>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    mock.requests.lock().unwrap().push(body);
    if !mock.status.is_success() {
        return (mock.status, Json(serde_json::json!({"error": "mock failure"}))).into_response();
    }
    let reply = {
        let mut replies = mock.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies.first().cloned().unwrap_or_default()
        }
    };
    Json(serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": reply}}]
    }))
    .into_response()
}

pub async fn spawn_gateway(status: u16, replies: &[&str]) -> MockGateway {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status: StatusCode::from_u16(status).unwrap(),
        replies: Arc::new(Mutex::new(replies.iter().map(|r| r.to_string()).collect())),
        requests: Arc::clone(&requests),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(complete))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockGateway {
        url: format!("http://{addr}/v1/chat/completions"),
        requests,
    }
}

/// A client pointed at `mock`.
pub fn gateway_client(mock: &MockGateway) -> GatewayClient {
    let config = AiConfig {
        gateway_url: mock.url.clone(),
        api_key: "test-key".into(),
        timeout_secs: 5,
        ..Default::default()
    };
    GatewayClient::from_config(&config).unwrap().unwrap()
}
