//! Remote Snippet Gateway: the backend REST surface this client consumes.
//!
//! The traits are the seam between client state logic and the network.
//! [`HttpGateway`] talks to the real backend; tests plug in in-memory fakes.
//! Calls that need a signed-in user take the [`Session`] explicitly.

mod admin;
mod http;

pub use admin::AdminGateway;
pub use http::{api_url, normalize_server, HttpGateway};

use crate::error::GatewayError;
use codex_core::models::collection::{Collection, CollectionRequest};
use codex_core::models::snippet::{
    CreateSnippetRequest, GistSyncResponse, Snippet, UpdateSnippetRequest,
};
use codex_core::models::user::{AuthResponse, LoginRequest, SignupRequest, User};
use codex_core::Session;
use serde_json::Value;
use std::future::Future;

/// Result of a like toggle.
///
/// Some backend versions return the full snippet, others only the new
/// like-set; the caller merges the latter onto its cached record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    Snippet(Snippet),
    Likes(Vec<String>),
}

/// Snippet CRUD, social actions and queries.
pub trait SnippetGateway: Send + Sync {
    fn list_public(&self) -> impl Future<Output = Result<Vec<Snippet>, GatewayError>> + Send;

    fn list_mine(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<Snippet>, GatewayError>> + Send;

    fn get_snippet(&self, id: &str)
        -> impl Future<Output = Result<Snippet, GatewayError>> + Send;

    fn create_snippet(
        &self,
        session: &Session,
        request: &CreateSnippetRequest,
    ) -> impl Future<Output = Result<Snippet, GatewayError>> + Send;

    fn update_snippet(
        &self,
        session: &Session,
        id: &str,
        request: &UpdateSnippetRequest,
    ) -> impl Future<Output = Result<Snippet, GatewayError>> + Send;

    fn delete_snippet(
        &self,
        session: &Session,
        id: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn toggle_like(
        &self,
        session: &Session,
        id: &str,
    ) -> impl Future<Output = Result<LikeOutcome, GatewayError>> + Send;

    fn add_comment(
        &self,
        session: &Session,
        id: &str,
        text: &str,
    ) -> impl Future<Output = Result<Snippet, GatewayError>> + Send;

    fn delete_comment(
        &self,
        session: &Session,
        id: &str,
        comment_id: &str,
    ) -> impl Future<Output = Result<Snippet, GatewayError>> + Send;

    fn fork_snippet(
        &self,
        session: &Session,
        id: &str,
    ) -> impl Future<Output = Result<Snippet, GatewayError>> + Send;

    fn sync_gist(
        &self,
        session: &Session,
        id: &str,
    ) -> impl Future<Output = Result<GistSyncResponse, GatewayError>> + Send;

    /// Count one view of `id`; callers deduplicate per client.
    fn record_view(&self, id: &str) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn search(&self, query: &str)
        -> impl Future<Output = Result<Vec<Snippet>, GatewayError>> + Send;

    fn snippets_by_tag(
        &self,
        tag: &str,
    ) -> impl Future<Output = Result<Vec<Snippet>, GatewayError>> + Send;
}

/// Collections owned by the signed-in user.
pub trait CollectionGateway: Send + Sync {
    fn list_collections(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<Collection>, GatewayError>> + Send;

    fn get_collection(
        &self,
        session: &Session,
        id: &str,
    ) -> impl Future<Output = Result<Collection, GatewayError>> + Send;

    fn create_collection(
        &self,
        session: &Session,
        request: &CollectionRequest,
    ) -> impl Future<Output = Result<Collection, GatewayError>> + Send;

    fn update_collection(
        &self,
        session: &Session,
        id: &str,
        request: &CollectionRequest,
    ) -> impl Future<Output = Result<Collection, GatewayError>> + Send;

    fn delete_collection(
        &self,
        session: &Session,
        id: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn add_to_collection(
        &self,
        session: &Session,
        collection_id: &str,
        snippet_id: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Login, signup and profile lookup.
pub trait AuthGateway: Send + Sync {
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, GatewayError>> + Send;

    fn signup(
        &self,
        request: &SignupRequest,
    ) -> impl Future<Output = Result<AuthResponse, GatewayError>> + Send;

    fn current_user(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<User, GatewayError>> + Send;
}

/// The full user-facing gateway surface.
pub trait Gateway: SnippetGateway + CollectionGateway + AuthGateway {}

impl<T> Gateway for T where T: SnippetGateway + CollectionGateway + AuthGateway {}

/// Decode a snippet list; the backend returns either a bare array or
/// `{ "snippets": [...] }`.
pub fn decode_snippet_list(value: Value) -> Result<Vec<Snippet>, GatewayError> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove("snippets") {
            Some(inner @ Value::Array(_)) => inner,
            _ => return Ok(Vec::new()),
        },
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(GatewayError::Decode(format!(
                "expected snippet list, got {}",
                json_kind(&other)
            )))
        }
    };
    serde_json::from_value(list).map_err(|err| GatewayError::Decode(err.to_string()))
}

/// Decode a single snippet, unwrapping `{ "snippet": {...} }` when present.
pub fn decode_snippet(value: Value) -> Result<Snippet, GatewayError> {
    let value = match value {
        Value::Object(mut map) if map.contains_key("snippet") && !map.contains_key("_id") => {
            map.remove("snippet").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(value).map_err(|err| GatewayError::Decode(err.to_string()))
}

/// Decode a like-toggle response.
pub fn decode_like(value: Value) -> Result<LikeOutcome, GatewayError> {
    match value {
        Value::Array(_) => serde_json::from_value(value)
            .map(LikeOutcome::Likes)
            .map_err(|err| GatewayError::Decode(err.to_string())),
        Value::Object(ref map) if !map.contains_key("_id") && !map.contains_key("snippet") => {
            let likes = map.get("likes").cloned().unwrap_or(Value::Array(Vec::new()));
            serde_json::from_value(likes)
                .map(LikeOutcome::Likes)
                .map_err(|err| GatewayError::Decode(err.to_string()))
        }
        other => decode_snippet(other).map(LikeOutcome::Snippet),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
