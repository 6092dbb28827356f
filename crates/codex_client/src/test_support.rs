//! In-memory gateway and fixtures shared by unit tests.

use crate::error::GatewayError;
use crate::gateway::{AuthGateway, CollectionGateway, LikeOutcome, SnippetGateway};
use codex_core::models::collection::{Collection, CollectionEntry, CollectionRequest};
use codex_core::models::snippet::{
    Comment, CreateSnippetRequest, GistSyncResponse, OwnerRef, Snippet, UpdateSnippetRequest,
    Visibility,
};
use codex_core::models::user::{AuthResponse, LoginRequest, SignupRequest, User};
use codex_core::Session;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

pub fn snippet(id: &str) -> Snippet {
    Snippet {
        id: id.to_string(),
        title: id.to_string(),
        description: String::new(),
        language: "rust".to_string(),
        code: format!("// {}", id),
        visibility: Visibility::Public,
        owner: Some(OwnerRef::Id("owner".to_string())),
        tags: Vec::new(),
        likes: Vec::new(),
        comments: Vec::new(),
        views: 0,
        gist_url: None,
        created_at: None,
    }
}

pub fn private_snippet(id: &str) -> Snippet {
    Snippet {
        visibility: Visibility::Private,
        ..snippet(id)
    }
}

pub fn owned_snippet(id: &str, owner_id: &str) -> Snippet {
    Snippet {
        owner: Some(OwnerRef::Id(owner_id.to_string())),
        ..snippet(id)
    }
}

pub fn user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        github_username: None,
        is_admin: false,
        created_at: None,
    }
}

pub fn session() -> Session {
    Session::new("token-ada", user("u1", "ada"))
}

/// Error a fake call fails with.
#[derive(Debug, Clone)]
pub enum FakeFailure {
    Unauthorized,
    Forbidden,
    /// Transport-level failure, as if the connection dropped.
    Network,
    Rejected(String),
}

impl FakeFailure {
    fn to_error(&self) -> GatewayError {
        match self {
            Self::Unauthorized => GatewayError::Unauthorized("Invalid credentials".to_string()),
            Self::Forbidden => GatewayError::Forbidden("Not allowed".to_string()),
            Self::Network => network_error(),
            Self::Rejected(message) => GatewayError::Rejected {
                status: 400,
                message: message.clone(),
            },
        }
    }
}

/// A real `reqwest` transport error, produced without touching the network.
pub fn network_error() -> GatewayError {
    match reqwest::Client::new().get("not a url").build() {
        Err(err) => GatewayError::Transport(err),
        Ok(_) => GatewayError::Decode("expected builder failure".to_string()),
    }
}

#[derive(Default)]
struct FakeState {
    snippets: HashMap<String, Snippet>,
    public: Vec<String>,
    mine: Vec<String>,
    tags: HashMap<String, Vec<Snippet>>,
    tag_delays: HashMap<String, Duration>,
    failing_tags: HashSet<String>,
    search: HashMap<String, Vec<Snippet>>,
    search_delay: Duration,
    failures: HashMap<&'static str, FakeFailure>,
    likes_only: bool,
    collections: Vec<Collection>,
    calls: Vec<&'static str>,
    tag_calls: Vec<String>,
    search_calls: Vec<(String, Instant)>,
    views: Vec<String>,
    next_id: u64,
}

/// Scriptable gateway backed by a mutex-guarded state map.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake gateway state")
    }

    /// Record the call and return the scripted failure for `op`, if any.
    fn enter(&self, op: &'static str) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.calls.push(op);
        match state.failures.get(op) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    pub fn seed(&self, snippet: Snippet) {
        self.state().snippets.insert(snippet.id.clone(), snippet);
    }

    pub fn set_public(&self, items: Vec<Snippet>) {
        let mut state = self.state();
        state.public = items.iter().map(|s| s.id.clone()).collect();
        for item in items {
            state.snippets.insert(item.id.clone(), item);
        }
    }

    pub fn set_mine(&self, items: Vec<Snippet>) {
        let mut state = self.state();
        state.mine = items.iter().map(|s| s.id.clone()).collect();
        for item in items {
            state.snippets.insert(item.id.clone(), item);
        }
    }

    pub fn stored(&self, id: &str) -> Option<Snippet> {
        self.state().snippets.get(id).cloned()
    }

    pub fn set_tag(&self, tag: &str, items: Vec<Snippet>) {
        self.state().tags.insert(tag.to_string(), items);
    }

    pub fn set_tag_delay(&self, tag: &str, delay: Duration) {
        self.state().tag_delays.insert(tag.to_string(), delay);
    }

    pub fn fail_tag(&self, tag: &str) {
        self.state().failing_tags.insert(tag.to_string());
    }

    pub fn set_search(&self, query: &str, items: Vec<Snippet>) {
        self.state().search.insert(query.to_string(), items);
    }

    pub fn set_search_delay(&self, delay: Duration) {
        self.state().search_delay = delay;
    }

    /// Make every call to `op` fail until [`FakeGateway::recover`].
    pub fn fail(&self, op: &'static str, failure: FakeFailure) {
        self.state().failures.insert(op, failure);
    }

    pub fn recover(&self, op: &'static str) {
        self.state().failures.remove(op);
    }

    /// Answer like toggles with the like-set only.
    pub fn likes_only(&self) {
        self.state().likes_only = true;
    }

    pub fn set_collections(&self, collections: Vec<Collection>) {
        self.state().collections = collections;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == op).count()
    }

    pub fn tag_calls(&self) -> Vec<String> {
        self.state().tag_calls.clone()
    }

    pub fn search_calls(&self) -> Vec<(String, Instant)> {
        self.state().search_calls.clone()
    }

    pub fn views(&self) -> Vec<String> {
        self.state().views.clone()
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let mut state = self.state();
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }

    fn lookup(&self, id: &str) -> Result<Snippet, GatewayError> {
        self.stored(id).ok_or(GatewayError::NotFound)
    }

    fn modify(
        &self,
        id: &str,
        change: impl FnOnce(&mut Snippet),
    ) -> Result<Snippet, GatewayError> {
        let mut state = self.state();
        let snippet = state.snippets.get_mut(id).ok_or(GatewayError::NotFound)?;
        change(snippet);
        Ok(snippet.clone())
    }

    fn listed(&self, ids: impl Fn(&FakeState) -> Vec<String>) -> Vec<Snippet> {
        let state = self.state();
        ids(&state)
            .iter()
            .filter_map(|id| state.snippets.get(id).cloned())
            .collect()
    }
}

impl SnippetGateway for FakeGateway {
    async fn list_public(&self) -> Result<Vec<Snippet>, GatewayError> {
        self.enter("list_public")?;
        Ok(self.listed(|s| s.public.clone()))
    }

    async fn list_mine(&self, _session: &Session) -> Result<Vec<Snippet>, GatewayError> {
        self.enter("list_mine")?;
        Ok(self.listed(|s| s.mine.clone()))
    }

    async fn get_snippet(&self, id: &str) -> Result<Snippet, GatewayError> {
        self.enter("get_snippet")?;
        self.lookup(id)
    }

    async fn create_snippet(
        &self,
        session: &Session,
        request: &CreateSnippetRequest,
    ) -> Result<Snippet, GatewayError> {
        self.enter("create_snippet")?;
        if request.title.trim().is_empty() {
            return Err(FakeFailure::Rejected("Title is required".to_string()).to_error());
        }
        let created = Snippet {
            id: self.fresh_id("new"),
            title: request.title.clone(),
            description: request.description.clone(),
            language: request.language.clone(),
            code: request.code.clone(),
            visibility: Visibility::from_flag(request.is_public),
            owner: Some(OwnerRef::Id(session.user.id.clone())),
            tags: request.tags.clone(),
            ..snippet("")
        };
        self.seed(created.clone());
        Ok(created)
    }

    async fn update_snippet(
        &self,
        _session: &Session,
        id: &str,
        request: &UpdateSnippetRequest,
    ) -> Result<Snippet, GatewayError> {
        self.enter("update_snippet")?;
        self.modify(id, |s| {
            if let Some(title) = &request.title {
                s.title = title.clone();
            }
            if let Some(description) = &request.description {
                s.description = description.clone();
            }
            if let Some(language) = &request.language {
                s.language = language.clone();
            }
            if let Some(code) = &request.code {
                s.code = code.clone();
            }
            if let Some(tags) = &request.tags {
                s.tags = tags.clone();
            }
            if let Some(is_public) = request.is_public {
                s.visibility = Visibility::from_flag(is_public);
            }
        })
    }

    async fn delete_snippet(&self, _session: &Session, id: &str) -> Result<(), GatewayError> {
        self.enter("delete_snippet")?;
        self.state()
            .snippets
            .remove(id)
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }

    async fn toggle_like(&self, session: &Session, id: &str) -> Result<LikeOutcome, GatewayError> {
        self.enter("toggle_like")?;
        let user_id = session.user.id.clone();
        let updated = self.modify(id, |s| {
            if s.is_liked_by(&user_id) {
                s.likes.retain(|l| l != &user_id);
            } else {
                s.likes.push(user_id.clone());
            }
        })?;
        if self.state().likes_only {
            Ok(LikeOutcome::Likes(updated.likes))
        } else {
            Ok(LikeOutcome::Snippet(updated))
        }
    }

    async fn add_comment(
        &self,
        session: &Session,
        id: &str,
        text: &str,
    ) -> Result<Snippet, GatewayError> {
        self.enter("add_comment")?;
        let comment = Comment {
            id: self.fresh_id("c"),
            username: session.user.username.clone(),
            text: text.to_string(),
            created_at: None,
        };
        self.modify(id, |s| s.comments.push(comment))
    }

    async fn delete_comment(
        &self,
        _session: &Session,
        id: &str,
        comment_id: &str,
    ) -> Result<Snippet, GatewayError> {
        self.enter("delete_comment")?;
        self.modify(id, |s| s.comments.retain(|c| c.id != comment_id))
    }

    async fn fork_snippet(&self, session: &Session, id: &str) -> Result<Snippet, GatewayError> {
        self.enter("fork_snippet")?;
        let source = self.lookup(id)?;
        let fork = Snippet {
            id: self.fresh_id("fork"),
            title: format!("{} (fork)", source.title),
            owner: Some(OwnerRef::Id(session.user.id.clone())),
            likes: Vec::new(),
            comments: Vec::new(),
            views: 0,
            gist_url: None,
            ..source
        };
        self.seed(fork.clone());
        Ok(fork)
    }

    async fn sync_gist(&self, _session: &Session, id: &str) -> Result<GistSyncResponse, GatewayError> {
        self.enter("sync_gist")?;
        let url = format!("https://gist.github.com/{}", id);
        let updated = self.modify(id, |s| s.gist_url = Some(url.clone()))?;
        Ok(GistSyncResponse {
            message: Some("Synced".to_string()),
            gist_url: Some(url),
            snippet: Some(updated),
        })
    }

    async fn record_view(&self, id: &str) -> Result<(), GatewayError> {
        self.enter("record_view")?;
        self.state().views.push(id.to_string());
        let _ = self.modify(id, |s| s.views += 1);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Snippet>, GatewayError> {
        let delay = {
            let mut state = self.state();
            state
                .search_calls
                .push((query.to_string(), Instant::now()));
            state.search_delay
        };
        self.enter("search")?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.state().search.get(query).cloned().unwrap_or_default())
    }

    async fn snippets_by_tag(&self, tag: &str) -> Result<Vec<Snippet>, GatewayError> {
        let (delay, fails, items) = {
            let mut state = self.state();
            state.tag_calls.push(tag.to_string());
            (
                state.tag_delays.get(tag).copied(),
                state.failing_tags.contains(tag),
                state.tags.get(tag).cloned().unwrap_or_default(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fails {
            return Err(network_error());
        }
        Ok(items)
    }
}

impl CollectionGateway for FakeGateway {
    async fn list_collections(&self, _session: &Session) -> Result<Vec<Collection>, GatewayError> {
        self.enter("list_collections")?;
        Ok(self.state().collections.clone())
    }

    async fn get_collection(&self, _session: &Session, id: &str) -> Result<Collection, GatewayError> {
        self.enter("get_collection")?;
        let state = self.state();
        let mut collection = state
            .collections
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(GatewayError::NotFound)?;
        // Populate references the way the backend does on detail fetches.
        for entry in &mut collection.snippets {
            if let Some(found) = state.snippets.get(entry.snippet_id()) {
                *entry = CollectionEntry::Snippet(Box::new(found.clone()));
            }
        }
        Ok(collection)
    }

    async fn create_collection(
        &self,
        session: &Session,
        request: &CollectionRequest,
    ) -> Result<Collection, GatewayError> {
        self.enter("create_collection")?;
        let collection = Collection {
            id: self.fresh_id("col"),
            name: request.name.clone(),
            description: request.description.clone(),
            snippets: Vec::new(),
            owner: Some(OwnerRef::Id(session.user.id.clone())),
            created_at: None,
        };
        self.state().collections.push(collection.clone());
        Ok(collection)
    }

    async fn update_collection(
        &self,
        _session: &Session,
        id: &str,
        request: &CollectionRequest,
    ) -> Result<Collection, GatewayError> {
        self.enter("update_collection")?;
        let mut state = self.state();
        let collection = state
            .collections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(GatewayError::NotFound)?;
        collection.name = request.name.clone();
        collection.description = request.description.clone();
        Ok(collection.clone())
    }

    async fn delete_collection(&self, _session: &Session, id: &str) -> Result<(), GatewayError> {
        self.enter("delete_collection")?;
        let mut state = self.state();
        let before = state.collections.len();
        state.collections.retain(|c| c.id != id);
        if state.collections.len() == before {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn add_to_collection(
        &self,
        _session: &Session,
        collection_id: &str,
        snippet_id: &str,
    ) -> Result<(), GatewayError> {
        self.enter("add_to_collection")?;
        let mut state = self.state();
        let collection = state
            .collections
            .iter_mut()
            .find(|c| c.id == collection_id)
            .ok_or(GatewayError::NotFound)?;
        if collection.contains(snippet_id) {
            return Err(FakeFailure::Rejected("Snippet already in collection".to_string()).to_error());
        }
        collection
            .snippets
            .push(CollectionEntry::Id(snippet_id.to_string()));
        Ok(())
    }
}

impl AuthGateway for FakeGateway {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, GatewayError> {
        self.enter("login")?;
        if request.password != "secret" {
            return Err(FakeFailure::Rejected("Invalid credentials".to_string()).to_error());
        }
        let username = request
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(AuthResponse {
            token: format!("token-{}", username),
            user: user("u1", &username),
        })
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, GatewayError> {
        self.enter("signup")?;
        Ok(AuthResponse {
            token: format!("token-{}", request.username),
            user: User {
                email: request.email.clone(),
                ..user("u2", &request.username)
            },
        })
    }

    async fn current_user(&self, session: &Session) -> Result<User, GatewayError> {
        self.enter("current_user")?;
        Ok(User {
            github_username: Some("ada-gh".to_string()),
            ..session.user.clone()
        })
    }
}
