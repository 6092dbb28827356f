//! Admin console: the admin gateway plus the volatile admin session.
//!
//! The admin key lives only in the volatile store handed to
//! [`AdminConsole::new`]; a rejected key clears it so the next call asks for
//! a fresh admin login.

use crate::error::{FailureAction, GatewayError};
use crate::gateway::AdminGateway;
use codex_core::models::admin::{
    AdminLoginRequest, AdminStats, AdminUser, GithubConnection, SeriesPoint,
};
use codex_core::models::snippet::Snippet;
use codex_core::{AdminSession, AdminSessionStore, ClientStore};
use std::sync::Arc;
use tracing::{info, warn};

pub type AdminResult<T> = Result<T, FailureAction>;

/// Everything the dashboard shows at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub stats: AdminStats,
    pub user_growth: Vec<SeriesPoint>,
    pub snippet_activity: Vec<SeriesPoint>,
}

pub struct AdminConsole {
    gateway: AdminGateway,
    sessions: AdminSessionStore,
}

impl AdminConsole {
    pub fn new(gateway: AdminGateway, volatile: Arc<dyn ClientStore>) -> Self {
        Self {
            gateway,
            sessions: AdminSessionStore::new(volatile),
        }
    }

    pub fn session(&self) -> Option<AdminSession> {
        self.sessions.load()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session().is_some()
    }

    pub async fn login(&self, username: &str, password: &str) -> AdminResult<AdminSession> {
        let request = AdminLoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        if request.username.is_empty() || request.password.is_empty() {
            return Err(FailureAction::ShowMessage(
                "Username and password are required".to_string(),
            ));
        }
        let session = match self.gateway.login(&request).await {
            Ok(session) => session,
            // A bad password is a message here, not a reason to re-login.
            Err(GatewayError::Unauthorized(_)) => {
                return Err(FailureAction::ShowMessage("Invalid admin credentials".to_string()))
            }
            Err(err) => return Err(self.fail("admin_login", err)),
        };
        if let Err(err) = self.sessions.save(&session) {
            warn!("failed to store admin key: {}", err);
        }
        info!("admin signed in");
        Ok(session)
    }

    /// Use an already issued admin key without a login round trip.
    pub fn adopt_key(&self, key: &str) -> AdminResult<AdminSession> {
        let key = key.trim();
        if key.is_empty() {
            return Err(FailureAction::AdminReLogin);
        }
        let session = AdminSession::new(key);
        if let Err(err) = self.sessions.save(&session) {
            warn!("failed to store admin key: {}", err);
        }
        Ok(session)
    }

    pub fn logout(&self) {
        self.clear();
    }

    pub async fn stats(&self) -> AdminResult<AdminStats> {
        let session = self.require_session()?;
        self.gateway
            .stats(&session)
            .await
            .map_err(|err| self.fail("admin_stats", err))
    }

    pub async fn user_growth(&self) -> AdminResult<Vec<SeriesPoint>> {
        let session = self.require_session()?;
        self.gateway
            .user_growth(&session)
            .await
            .map_err(|err| self.fail("admin_user_growth", err))
    }

    pub async fn snippet_activity(&self) -> AdminResult<Vec<SeriesPoint>> {
        let session = self.require_session()?;
        self.gateway
            .snippet_activity(&session)
            .await
            .map_err(|err| self.fail("admin_snippet_activity", err))
    }

    /// Fetch stats and both chart series concurrently.
    pub async fn dashboard(&self) -> AdminResult<Dashboard> {
        let session = self.require_session()?;
        let (stats, user_growth, snippet_activity) = futures::try_join!(
            self.gateway.stats(&session),
            self.gateway.user_growth(&session),
            self.gateway.snippet_activity(&session),
        )
        .map_err(|err| self.fail("admin_dashboard", err))?;
        Ok(Dashboard {
            stats,
            user_growth,
            snippet_activity,
        })
    }

    pub async fn users(&self) -> AdminResult<Vec<AdminUser>> {
        let session = self.require_session()?;
        self.gateway
            .users(&session)
            .await
            .map_err(|err| self.fail("admin_users", err))
    }

    pub async fn delete_user(&self, id: &str) -> AdminResult<()> {
        let session = self.require_session()?;
        self.gateway
            .delete_user(&session, id)
            .await
            .map_err(|err| self.fail("admin_delete_user", err))
    }

    pub async fn snippets(&self) -> AdminResult<Vec<Snippet>> {
        let session = self.require_session()?;
        self.gateway
            .snippets(&session)
            .await
            .map_err(|err| self.fail("admin_snippets", err))
    }

    pub async fn delete_snippet(&self, id: &str) -> AdminResult<()> {
        let session = self.require_session()?;
        self.gateway
            .delete_snippet(&session, id)
            .await
            .map_err(|err| self.fail("admin_delete_snippet", err))
    }

    pub async fn github_users(&self) -> AdminResult<Vec<GithubConnection>> {
        let session = self.require_session()?;
        self.gateway
            .github_users(&session)
            .await
            .map_err(|err| self.fail("admin_github_users", err))
    }

    pub async fn revoke_github(&self, user_id: &str) -> AdminResult<()> {
        let session = self.require_session()?;
        self.gateway
            .revoke_github(&session, user_id)
            .await
            .map_err(|err| self.fail("admin_revoke_github", err))
    }

    fn require_session(&self) -> AdminResult<AdminSession> {
        self.session().ok_or(FailureAction::AdminReLogin)
    }

    fn fail(&self, op: &'static str, err: GatewayError) -> FailureAction {
        let action = err.classify_admin();
        warn!(op, "admin request failed: {}", err);
        if action == FailureAction::AdminReLogin {
            self.clear();
        }
        action
    }

    fn clear(&self) {
        if let Err(err) = self.sessions.clear() {
            warn!("failed to clear admin key: {}", err);
        }
    }
}
