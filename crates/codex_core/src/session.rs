//! Session value objects and their persistence.
//!
//! Sessions are plain values handed to the services that need them. Only the
//! store types below read or write client storage.

use crate::constants::{ADMIN_KEY_KEY, TOKEN_KEY, USER_KEY, VIEWED_SNIPPETS_KEY};
use crate::error::StoreError;
use crate::models::user::User;
use crate::storage::{load_json, save_json, ClientStore, Stored};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Signed-in user: bearer token plus the cached profile.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// `(user id, username)` pair used for permission checks.
    pub fn viewer(&self) -> (&str, &str) {
        (self.user.id.as_str(), self.user.username.as_str())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user.username)
            .finish()
    }
}

/// Admin console credential, independent of the user session.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub key: String,
}

impl AdminSession {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSession")
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Persists the user [`Session`] in durable storage.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn ClientStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    /// Load the stored session.
    ///
    /// A token without a decodable profile (or vice versa) counts as
    /// [`Stored::Invalid`] and both halves are cleared.
    pub fn load(&self) -> Stored<Session> {
        let token = self
            .store
            .get(TOKEN_KEY)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());
        let user = load_json::<User>(self.store.as_ref(), USER_KEY);
        match (token, user) {
            (None, Stored::Absent) => Stored::Absent,
            (Some(token), Stored::Present(user)) => Stored::Present(Session { token, user }),
            _ => {
                debug!("stored session incomplete; clearing");
                if let Err(err) = self.clear() {
                    warn!("failed to clear incomplete session: {}", err);
                }
                Stored::Invalid
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.store.set(TOKEN_KEY, &session.token)?;
        save_json(self.store.as_ref(), USER_KEY, &session.user)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)
    }
}

/// Keeps the [`AdminSession`] in volatile storage.
#[derive(Clone)]
pub struct AdminSessionStore {
    store: Arc<dyn ClientStore>,
}

impl AdminSessionStore {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Option<AdminSession> {
        self.store
            .get(ADMIN_KEY_KEY)
            .map(|raw| raw.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(AdminSession::new)
    }

    pub fn save(&self, session: &AdminSession) -> Result<(), StoreError> {
        self.store.set(ADMIN_KEY_KEY, &session.key)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(ADMIN_KEY_KEY)
    }
}

/// Snippet ids whose view has already been counted by this client.
#[derive(Clone)]
pub struct ViewedSnippets {
    store: Arc<dyn ClientStore>,
}

impl ViewedSnippets {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    pub fn ids(&self) -> Vec<String> {
        load_json::<Vec<String>>(self.store.as_ref(), VIEWED_SNIPPETS_KEY)
            .present()
            .unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids().iter().any(|viewed| viewed == id)
    }

    /// Record `id` as viewed.
    ///
    /// # Returns
    /// `true` when the id was not recorded before.
    pub fn mark(&self, id: &str) -> Result<bool, StoreError> {
        let mut ids = self.ids();
        if ids.iter().any(|viewed| viewed == id) {
            return Ok(false);
        }
        ids.push(id.to_string());
        save_json(self.store.as_ref(), VIEWED_SNIPPETS_KEY, &ids)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use tempfile::TempDir;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            github_username: None,
            is_admin: false,
            created_at: None,
        }
    }

    #[test]
    fn session_round_trips_through_store() {
        let store: Arc<dyn ClientStore> = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(store.clone());
        assert_eq!(sessions.load(), Stored::Absent);

        let session = Session::new("tok", user());
        sessions.save(&session).expect("save");
        assert_eq!(sessions.load(), Stored::Present(session));

        sessions.clear().expect("clear");
        assert_eq!(sessions.load(), Stored::Absent);
    }

    #[test]
    fn token_without_profile_is_invalid_and_cleared() {
        let store: Arc<dyn ClientStore> = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "tok").expect("set token");
        let sessions = SessionStore::new(store.clone());

        assert_eq!(sessions.load(), Stored::Invalid);
        assert!(store.get(TOKEN_KEY).is_none());
        assert_eq!(sessions.load(), Stored::Absent);
    }

    #[test]
    fn corrupt_profile_is_invalid() {
        let store: Arc<dyn ClientStore> = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "tok").expect("set token");
        store.set(USER_KEY, "{\"username\":").expect("set user");
        assert_eq!(SessionStore::new(store).load(), Stored::Invalid);
    }

    #[test]
    fn admin_session_ignores_blank_key() {
        let store: Arc<dyn ClientStore> = Arc::new(MemoryStore::new());
        let admin = AdminSessionStore::new(store.clone());
        store.set(ADMIN_KEY_KEY, "   ").expect("set");
        assert!(admin.load().is_none());

        admin.save(&AdminSession::new("k")).expect("save");
        assert_eq!(admin.load(), Some(AdminSession::new("k")));
        admin.clear().expect("clear");
        assert!(admin.load().is_none());
    }

    #[test]
    fn viewed_snippets_mark_once() {
        let store: Arc<dyn ClientStore> = Arc::new(MemoryStore::new());
        let viewed = ViewedSnippets::new(store.clone());
        assert!(viewed.mark("s1").expect("mark"));
        assert!(!viewed.mark("s1").expect("mark again"));
        assert!(viewed.mark("s2").expect("mark s2"));
        assert_eq!(viewed.ids(), vec!["s1".to_string(), "s2".to_string()]);

        store.set(VIEWED_SNIPPETS_KEY, "oops").expect("corrupt");
        assert!(viewed.ids().is_empty());
        assert!(viewed.mark("s1").expect("mark after reset"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?} {:?}", Session::new("secret-token", user()), AdminSession::new("secret-key"));
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn incomplete_session_is_invalid_even_when_clearing_fails() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("state.json");
        let file = Arc::new(FileStore::open(&path).expect("open"));
        file.set(TOKEN_KEY, "orphan-token").expect("set token");
        std::fs::create_dir(path.with_extension("json.tmp")).expect("block writes");

        let sessions = SessionStore::new(file.clone());

        assert_eq!(sessions.load(), Stored::Invalid);
        assert_eq!(file.get(TOKEN_KEY).as_deref(), Some("orphan-token"));
    }
}
