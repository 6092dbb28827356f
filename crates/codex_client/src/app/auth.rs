//! Login, signup, logout and profile.

use super::{AppResult, CodexApp, StatusLevel};
use crate::gateway::Gateway;
use codex_core::models::user::{AuthResponse, LoginRequest, SignupRequest, User};
use codex_core::Session;
use tracing::{info, warn};

impl<G: Gateway + 'static> CodexApp<G> {
    pub async fn login(&mut self, email: &str, password: &str) -> AppResult<&Session> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        if request.email.is_empty() || request.password.is_empty() {
            return Err(self.reject("Email and password are required"));
        }
        match self.gateway.login(&request).await {
            Ok(response) => Ok(self.start_session(response)),
            Err(err) => {
                let action = err.classify_credentials();
                Err(self.react("login", &err, action))
            }
        }
    }

    pub async fn signup(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<&Session> {
        let request = SignupRequest {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        if request.username.is_empty() || request.email.is_empty() || request.password.is_empty() {
            return Err(self.reject("Username, email and password are required"));
        }
        match self.gateway.signup(&request).await {
            Ok(response) => Ok(self.start_session(response)),
            Err(err) => {
                let action = err.classify_credentials();
                Err(self.react("signup", &err, action))
            }
        }
    }

    /// Drop the session locally; the gateway keeps no server-side state.
    pub fn logout(&mut self) {
        self.clear_session();
        self.needs_login = false;
        self.set_status(StatusLevel::Info, "Logged out");
    }

    /// Refresh the cached user record from the gateway.
    pub async fn load_profile(&mut self) -> AppResult<User> {
        let session = self.require_session("current_user")?;
        let user = match self.gateway.current_user(&session).await {
            Ok(user) => user,
            Err(err) => return Err(self.fail("current_user", err)),
        };
        let refreshed = Session::new(session.token, user.clone());
        if let Err(err) = self.sessions.save(&refreshed) {
            warn!("failed to persist refreshed profile: {}", err);
        }
        self.session = Some(refreshed);
        Ok(user)
    }

    fn start_session(&mut self, response: AuthResponse) -> &Session {
        let session = Session::new(response.token, response.user);
        let same_user = self
            .session
            .as_ref()
            .is_some_and(|current| current.user.id == session.user.id);
        if !same_user {
            self.drop_user_state();
        }
        info!(user = session.user.username.as_str(), "signed in");
        if let Err(err) = self.sessions.save(&session) {
            warn!("failed to persist session: {}", err);
            self.set_status(StatusLevel::Error, "Signed in, but the session could not be saved");
        }
        self.needs_login = false;
        self.set_status(
            StatusLevel::Info,
            format!("Welcome, {}", session.user.username),
        );
        self.session.insert(session)
    }
}
