//! Admin surface of the gateway, authenticated with the `x-admin-key` header.

use super::{decode_snippet_list, HttpGateway};
use crate::error::GatewayError;
use codex_core::models::admin::{
    AdminLoginRequest, AdminLoginResponse, AdminStats, AdminUser, GithubConnection, SeriesPoint,
};
use codex_core::models::snippet::Snippet;
use codex_core::{AdminSession, ADMIN_KEY_HEADER};
use reqwest::{Method, RequestBuilder};

/// Admin endpoints share the user gateway's client and base URL but never
/// its bearer token.
#[derive(Debug, Clone)]
pub struct AdminGateway {
    inner: HttpGateway,
}

impl AdminGateway {
    pub fn new(inner: HttpGateway) -> Self {
        Self { inner }
    }

    fn keyed(
        &self,
        method: Method,
        segments: &[&str],
        session: &AdminSession,
    ) -> Result<RequestBuilder, GatewayError> {
        Ok(self
            .inner
            .request(method, segments)?
            .header(ADMIN_KEY_HEADER, session.key.as_str()))
    }

    pub async fn login(&self, request: &AdminLoginRequest) -> Result<AdminSession, GatewayError> {
        let builder = self
            .inner
            .request(Method::POST, &["api", "admin", "login"])?
            .json(request);
        let response: AdminLoginResponse = self.inner.send_json("admin_login", builder).await?;
        Ok(AdminSession::new(response.admin_key))
    }

    pub async fn stats(&self, session: &AdminSession) -> Result<AdminStats, GatewayError> {
        let builder = self.keyed(Method::GET, &["api", "admin", "stats"], session)?;
        self.inner.send_json("admin_stats", builder).await
    }

    pub async fn user_growth(
        &self,
        session: &AdminSession,
    ) -> Result<Vec<SeriesPoint>, GatewayError> {
        let builder = self.keyed(Method::GET, &["api", "admin", "user-growth"], session)?;
        self.inner.send_json("admin_user_growth", builder).await
    }

    pub async fn snippet_activity(
        &self,
        session: &AdminSession,
    ) -> Result<Vec<SeriesPoint>, GatewayError> {
        let builder = self.keyed(Method::GET, &["api", "admin", "snippet-activity"], session)?;
        self.inner.send_json("admin_snippet_activity", builder).await
    }

    pub async fn users(&self, session: &AdminSession) -> Result<Vec<AdminUser>, GatewayError> {
        let builder = self.keyed(Method::GET, &["api", "admin", "users"], session)?;
        self.inner.send_json("admin_users", builder).await
    }

    pub async fn delete_user(&self, session: &AdminSession, id: &str) -> Result<(), GatewayError> {
        let builder = self.keyed(Method::DELETE, &["api", "admin", "users", id], session)?;
        self.inner
            .send_value("admin_delete_user", builder)
            .await
            .map(|_| ())
    }

    pub async fn snippets(&self, session: &AdminSession) -> Result<Vec<Snippet>, GatewayError> {
        let builder = self.keyed(Method::GET, &["api", "admin", "snippets"], session)?;
        decode_snippet_list(self.inner.send_value("admin_snippets", builder).await?)
    }

    pub async fn delete_snippet(
        &self,
        session: &AdminSession,
        id: &str,
    ) -> Result<(), GatewayError> {
        let builder = self.keyed(Method::DELETE, &["api", "admin", "snippets", id], session)?;
        self.inner
            .send_value("admin_delete_snippet", builder)
            .await
            .map(|_| ())
    }

    pub async fn github_users(
        &self,
        session: &AdminSession,
    ) -> Result<Vec<GithubConnection>, GatewayError> {
        let builder = self.keyed(Method::GET, &["api", "admin", "github-users"], session)?;
        self.inner.send_json("admin_github_users", builder).await
    }

    pub async fn revoke_github(
        &self,
        session: &AdminSession,
        user_id: &str,
    ) -> Result<(), GatewayError> {
        let builder = self.keyed(
            Method::POST,
            &["api", "admin", "github-users", "revoke", user_id],
            session,
        )?;
        self.inner
            .send_value("admin_revoke_github", builder)
            .await
            .map(|_| ())
    }
}
