//! reqwest-backed implementation of the gateway traits.

use super::{
    decode_like, decode_snippet, decode_snippet_list, AuthGateway, CollectionGateway,
    LikeOutcome, SnippetGateway,
};
use crate::error::GatewayError;
use codex_core::models::collection::{AddSnippetRequest, Collection, CollectionRequest};
use codex_core::models::snippet::{
    CreateSnippetRequest, GistSyncResponse, Snippet, UpdateSnippetRequest,
};
use codex_core::models::user::{AuthResponse, LoginRequest, SignupRequest, User};
use codex_core::{Config, Session};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Build an API URL by appending percent-encoded path segments to `server`.
pub fn api_url(server: &str, segments: &[&str]) -> Result<Url, GatewayError> {
    let mut url = Url::parse(server)
        .map_err(|err| GatewayError::InvalidUrl(format!("'{}': {}", server, err)))?;
    let mut path = url.path_segments_mut().map_err(|_| {
        GatewayError::InvalidUrl(format!("'{}' cannot be used as an API base", server))
    })?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

/// Trim trailing slashes and map `http://localhost` to the loopback address.
pub fn normalize_server(server: &str) -> String {
    let trimmed = server.trim();
    if let Ok(mut url) = Url::parse(trimmed) {
        let is_plain_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if is_plain_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return trimmed.to_string();
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    trimmed.to_string()
}

/// HTTP client for the user-facing gateway endpoints.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    pub(super) client: Client,
    pub(super) server: String,
    pub(super) perf_log: bool,
}

impl HttpGateway {
    /// Build a gateway from runtime configuration.
    ///
    /// # Errors
    /// Returns an error when the configured URL is unusable or the HTTP client
    /// cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let mut gateway = Self::with_client(client, &config.api_url)?;
        gateway.perf_log = config.gateway_perf_log;
        Ok(gateway)
    }

    pub fn with_client(client: Client, server: &str) -> Result<Self, GatewayError> {
        let server = normalize_server(server);
        api_url(&server, &[])?;
        Ok(Self {
            client,
            server,
            perf_log: false,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub(super) fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, GatewayError> {
        let url = api_url(&self.server, segments)?;
        Ok(self.client.request(method, url))
    }

    fn authed(
        &self,
        method: Method,
        segments: &[&str],
        session: &Session,
    ) -> Result<RequestBuilder, GatewayError> {
        Ok(self.request(method, segments)?.bearer_auth(&session.token))
    }

    /// Send a request and return the decoded JSON body.
    pub(super) async fn send_value(
        &self,
        label: &str,
        builder: RequestBuilder,
    ) -> Result<Value, GatewayError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let response = builder
            .header("x-request-id", request_id.to_string())
            .send()
            .await
            .map_err(|err| {
                warn!(op = label, %request_id, "gateway transport failure: {}", err);
                GatewayError::Transport(err)
            })?;
        let status = response.status();
        let body = response.text().await?;
        self.log_perf(label, status.as_u16(), started.elapsed(), body.len());
        if !status.is_success() {
            let err = GatewayError::from_status(status, &body);
            warn!(op = label, %request_id, status = status.as_u16(), "gateway call failed: {}", err);
            return Err(err);
        }
        debug!(op = label, %request_id, status = status.as_u16(), "gateway call ok");
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|err| GatewayError::Decode(err.to_string()))
    }

    pub(super) async fn send_json<T: DeserializeOwned>(
        &self,
        label: &str,
        builder: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let value = self.send_value(label, builder).await?;
        serde_json::from_value(value).map_err(|err| GatewayError::Decode(err.to_string()))
    }

    fn log_perf(&self, op: &str, status: u16, elapsed: Duration, bytes: usize) {
        if !self.perf_log {
            return;
        }
        info!(
            target: "codex_client::gateway_perf",
            op = op,
            status = status,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            bytes = bytes,
            "gateway request perf"
        );
    }

    async fn post_for_snippet<B: Serialize + ?Sized>(
        &self,
        label: &str,
        session: &Session,
        segments: &[&str],
        body: &B,
    ) -> Result<Snippet, GatewayError> {
        let builder = self.authed(Method::POST, segments, session)?.json(body);
        decode_snippet(self.send_value(label, builder).await?)
    }
}

impl SnippetGateway for HttpGateway {
    async fn list_public(&self) -> Result<Vec<Snippet>, GatewayError> {
        let builder = self.request(Method::GET, &["api", "snippets", "public"])?;
        decode_snippet_list(self.send_value("list_public", builder).await?)
    }

    async fn list_mine(&self, session: &Session) -> Result<Vec<Snippet>, GatewayError> {
        let builder = self.authed(Method::GET, &["api", "snippets", "mine"], session)?;
        decode_snippet_list(self.send_value("list_mine", builder).await?)
    }

    async fn get_snippet(&self, id: &str) -> Result<Snippet, GatewayError> {
        let builder = self.request(Method::GET, &["api", "snippets", id])?;
        decode_snippet(self.send_value("get_snippet", builder).await?)
    }

    async fn create_snippet(
        &self,
        session: &Session,
        request: &CreateSnippetRequest,
    ) -> Result<Snippet, GatewayError> {
        self.post_for_snippet("create_snippet", session, &["api", "snippets"], request)
            .await
    }

    async fn update_snippet(
        &self,
        session: &Session,
        id: &str,
        request: &UpdateSnippetRequest,
    ) -> Result<Snippet, GatewayError> {
        let builder = self
            .authed(Method::PUT, &["api", "snippets", id], session)?
            .json(request);
        decode_snippet(self.send_value("update_snippet", builder).await?)
    }

    async fn delete_snippet(&self, session: &Session, id: &str) -> Result<(), GatewayError> {
        let builder = self.authed(Method::DELETE, &["api", "snippets", id], session)?;
        self.send_value("delete_snippet", builder).await.map(|_| ())
    }

    async fn toggle_like(&self, session: &Session, id: &str) -> Result<LikeOutcome, GatewayError> {
        let builder = self
            .authed(Method::POST, &["api", "snippets", id, "like"], session)?
            .json(&serde_json::json!({}));
        decode_like(self.send_value("toggle_like", builder).await?)
    }

    async fn add_comment(
        &self,
        session: &Session,
        id: &str,
        text: &str,
    ) -> Result<Snippet, GatewayError> {
        let body = serde_json::json!({ "text": text });
        self.post_for_snippet("add_comment", session, &["api", "snippets", id, "comments"], &body)
            .await
    }

    async fn delete_comment(
        &self,
        session: &Session,
        id: &str,
        comment_id: &str,
    ) -> Result<Snippet, GatewayError> {
        let builder = self.authed(
            Method::DELETE,
            &["api", "snippets", id, "comments", comment_id],
            session,
        )?;
        decode_snippet(self.send_value("delete_comment", builder).await?)
    }

    async fn fork_snippet(&self, session: &Session, id: &str) -> Result<Snippet, GatewayError> {
        let body = serde_json::json!({});
        self.post_for_snippet("fork_snippet", session, &["api", "snippets", id, "fork"], &body)
            .await
    }

    async fn sync_gist(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<GistSyncResponse, GatewayError> {
        let builder = self
            .authed(Method::POST, &["api", "snippets", id, "sync-github"], session)?
            .json(&serde_json::json!({}));
        self.send_json("sync_gist", builder).await
    }

    async fn record_view(&self, id: &str) -> Result<(), GatewayError> {
        let builder = self.request(Method::POST, &["api", "snippets", id, "view"])?;
        self.send_value("record_view", builder).await.map(|_| ())
    }

    async fn search(&self, query: &str) -> Result<Vec<Snippet>, GatewayError> {
        let builder = self
            .request(Method::GET, &["api", "snippets", "search"])?
            .query(&[("q", query)]);
        decode_snippet_list(self.send_value("search", builder).await?)
    }

    async fn snippets_by_tag(&self, tag: &str) -> Result<Vec<Snippet>, GatewayError> {
        let builder = self.request(Method::GET, &["api", "snippets", "tag", tag])?;
        decode_snippet_list(self.send_value("snippets_by_tag", builder).await?)
    }
}

impl CollectionGateway for HttpGateway {
    async fn list_collections(&self, session: &Session) -> Result<Vec<Collection>, GatewayError> {
        let builder = self.authed(Method::GET, &["api", "collections"], session)?;
        match self.send_value("list_collections", builder).await? {
            Value::Null => Ok(Vec::new()),
            value => serde_json::from_value(value).map_err(|err| GatewayError::Decode(err.to_string())),
        }
    }

    async fn get_collection(&self, session: &Session, id: &str) -> Result<Collection, GatewayError> {
        let builder = self.authed(Method::GET, &["api", "collections", id], session)?;
        self.send_json("get_collection", builder).await
    }

    async fn create_collection(
        &self,
        session: &Session,
        request: &CollectionRequest,
    ) -> Result<Collection, GatewayError> {
        let builder = self
            .authed(Method::POST, &["api", "collections"], session)?
            .json(request);
        self.send_json("create_collection", builder).await
    }

    async fn update_collection(
        &self,
        session: &Session,
        id: &str,
        request: &CollectionRequest,
    ) -> Result<Collection, GatewayError> {
        let builder = self
            .authed(Method::PUT, &["api", "collections", id], session)?
            .json(request);
        self.send_json("update_collection", builder).await
    }

    async fn delete_collection(&self, session: &Session, id: &str) -> Result<(), GatewayError> {
        let builder = self.authed(Method::DELETE, &["api", "collections", id], session)?;
        self.send_value("delete_collection", builder).await.map(|_| ())
    }

    async fn add_to_collection(
        &self,
        session: &Session,
        collection_id: &str,
        snippet_id: &str,
    ) -> Result<(), GatewayError> {
        let body = AddSnippetRequest {
            snippet_id: snippet_id.to_string(),
        };
        let builder = self
            .authed(
                Method::PUT,
                &["api", "collections", collection_id, "add-snippet"],
                session,
            )?
            .json(&body);
        self.send_value("add_to_collection", builder).await.map(|_| ())
    }
}

impl AuthGateway for HttpGateway {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, GatewayError> {
        let builder = self
            .request(Method::POST, &["api", "auth", "login"])?
            .json(request);
        self.send_json("login", builder).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, GatewayError> {
        let builder = self
            .request(Method::POST, &["api", "auth", "signup"])?
            .json(request);
        self.send_json("signup", builder).await
    }

    async fn current_user(&self, session: &Session) -> Result<User, GatewayError> {
        let builder = self.authed(Method::GET, &["api", "auth", "me"], session)?;
        self.send_json("current_user", builder).await
    }
}
