//! Stub backend for gateway integration tests.
//!
//! Serves a small fixed data set over the same REST shape as the real
//! backend and records what it was asked for.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const USER_TOKEN: &str = "good-token";
pub const ADMIN_KEY: &str = "admin-key";

#[derive(Default)]
pub struct Recorded {
    pub searches: Vec<String>,
    pub tags: Vec<String>,
    pub views: Vec<String>,
    pub request_ids: Vec<String>,
    pub created: Vec<Value>,
    pub deleted_users: Vec<String>,
    pub likes: HashMap<String, Vec<String>>,
}

#[derive(Clone, Default)]
pub struct StubState {
    pub recorded: Arc<Mutex<Recorded>>,
}

impl StubState {
    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().expect("stub state")
    }

    fn note_request(&self, headers: &HeaderMap) {
        if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
            self.recorded().request_ids.push(id.to_string());
        }
    }
}

pub struct StubServer {
    pub url: String,
    pub state: StubState,
}

pub fn snippet_json(id: &str, title: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "description": "",
        "language": "rust",
        "code": "fn main() {}",
        "isPublic": true,
        "user": { "_id": "u9", "username": "grace" },
        "tags": ["rust"],
        "likes": [],
        "comments": [],
        "views": 3,
        "createdAt": "2024-05-01T10:00:00.000Z"
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", USER_TOKEN))
}

fn admin_ok(headers: &HeaderMap) -> bool {
    headers
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == ADMIN_KEY)
}

async fn list_public(State(state): State<StubState>, headers: HeaderMap) -> Response {
    state.note_request(&headers);
    let likes = state.recorded().likes.get("s1").cloned().unwrap_or_default();
    let mut first = snippet_json("s1", "First");
    first["likes"] = json!(likes);
    Json(json!({ "snippets": [first, snippet_json("s2", "Second")] })).into_response()
}

async fn list_mine(State(state): State<StubState>, headers: HeaderMap) -> Response {
    state.note_request(&headers);
    if !bearer_ok(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, token failed");
    }
    Json(json!([])).into_response()
}

async fn get_snippet(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "s1" => Json(snippet_json("s1", "First")).into_response(),
        "s2" => Json(snippet_json("s2", "Second")).into_response(),
        _ => error(StatusCode::NOT_FOUND, "Snippet not found"),
    }
}

async fn create_snippet(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !bearer_ok(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, no token");
    }
    let title = body["title"].as_str().unwrap_or_default().trim().to_string();
    if title.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Title is required");
    }
    state.recorded().created.push(body.clone());
    let mut created = snippet_json("new1", &title);
    created["isPublic"] = body["isPublic"].clone();
    created["user"] = json!("u1");
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn toggle_like(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !bearer_ok(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    let mut recorded = state.recorded();
    let likes = recorded.likes.entry(id).or_default();
    if likes.iter().any(|l| l == "u1") {
        likes.retain(|l| l != "u1");
    } else {
        likes.push("u1".to_string());
    }
    Json(json!(likes.clone())).into_response()
}

async fn record_view(State(state): State<StubState>, Path(id): Path<String>) -> Response {
    state.recorded().views.push(id);
    Json(json!({ "message": "View recorded" })).into_response()
}

async fn search(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let query = params.get("q").cloned().unwrap_or_default();
    state.recorded().searches.push(query.clone());
    Json(json!([snippet_json("hit", &query)])).into_response()
}

async fn by_tag(State(state): State<StubState>, Path(tag): Path<String>) -> Response {
    state.recorded().tags.push(tag.clone());
    Json(json!([snippet_json(&format!("tag-{}", tag.len()), &tag)])).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    Json(json!({
        "token": USER_TOKEN,
        "user": { "id": "u1", "username": "ada", "email": body["email"] }
    }))
    .into_response()
}

async fn admin_login(Json(body): Json<Value>) -> Response {
    if body["username"] != "admin" || body["password"] != "admin123" {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    Json(json!({ "adminKey": ADMIN_KEY })).into_response()
}

async fn admin_stats(headers: HeaderMap) -> Response {
    if !admin_ok(&headers) {
        return error(StatusCode::FORBIDDEN, "Invalid admin key");
    }
    Json(json!({ "totalUsers": 12, "totalSnippets": 40, "activeToday": 3 })).into_response()
}

async fn admin_series(headers: HeaderMap) -> Response {
    if !admin_ok(&headers) {
        return error(StatusCode::FORBIDDEN, "Invalid admin key");
    }
    Json(json!([{ "_id": "2024-05", "count": 4 }, { "_id": "2024-06", "count": 7 }]))
        .into_response()
}

async fn admin_delete_user(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !admin_ok(&headers) {
        return error(StatusCode::FORBIDDEN, "Invalid admin key");
    }
    state.recorded().deleted_users.push(id);
    Json(json!({ "message": "User deleted" })).into_response()
}

async fn admin_github_users(headers: HeaderMap) -> Response {
    if !admin_ok(&headers) {
        return error(StatusCode::FORBIDDEN, "Invalid admin key");
    }
    Json(json!([{
        "_id": "u1",
        "username": "ada",
        "email": "ada@example.com",
        "githubUsername": "ada-gh",
        "connected": true
    }]))
    .into_response()
}

pub fn router(state: StubState) -> Router {
    Router::new()
        .route("/api/snippets/public", get(list_public))
        .route("/api/snippets/mine", get(list_mine))
        .route("/api/snippets/search", get(search))
        .route("/api/snippets/tag/:tag", get(by_tag))
        .route("/api/snippets", post(create_snippet))
        .route("/api/snippets/:id", get(get_snippet))
        .route("/api/snippets/:id/like", post(toggle_like))
        .route("/api/snippets/:id/view", post(record_view))
        .route("/api/auth/login", post(login))
        .route("/api/admin/login", post(admin_login))
        .route("/api/admin/stats", get(admin_stats))
        .route("/api/admin/user-growth", get(admin_series))
        .route("/api/admin/snippet-activity", get(admin_series))
        .route("/api/admin/users/:id", delete(admin_delete_user))
        .route("/api/admin/github-users", get(admin_github_users))
        .with_state(state)
}

/// Serve the stub on an ephemeral loopback port.
pub async fn spawn_stub() -> StubServer {
    let state = StubState::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });
    StubServer {
        url: format!("http://{}", addr),
        state,
    }
}

/// An address nothing listens on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}", addr)
}
