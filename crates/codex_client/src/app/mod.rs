//! Client state controller.
//!
//! `CodexApp` owns the snippet cache, the filter set, the search dispatcher
//! and the active view. Every mutating operation calls the gateway first and
//! only feeds the confirmed result through the synchronizer, so a failed call
//! never changes cached state.

mod auth;
mod collections;
mod search;
mod snippets;

#[cfg(test)]
mod tests;

use crate::aggregator::TagFilterAggregator;
use crate::cache::{Partition, SnippetCache};
use crate::debounce::QueryDispatcher;
use crate::error::{FailureAction, GatewayError};
use crate::gateway::Gateway;
use codex_core::models::collection::Collection;
use codex_core::models::snippet::{Snippet, SnippetPermissions};
use codex_core::view::ListSource;
use codex_core::{ClientStore, Session, SessionStore, Stored, View, ViewedSnippets};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const STATUS_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// User-facing feedback line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

pub type AppResult<T> = Result<T, FailureAction>;

pub struct CodexApp<G> {
    gateway: Arc<G>,
    sessions: SessionStore,
    viewed: ViewedSnippets,
    session: Option<Session>,
    cache: SnippetCache,
    filters: TagFilterAggregator,
    search: QueryDispatcher<G>,
    view: View,
    collections: Vec<Collection>,
    selected_collection: Option<Collection>,
    statuses: VecDeque<StatusMessage>,
    needs_login: bool,
}

impl<G: Gateway + 'static> CodexApp<G> {
    /// Build the controller, restoring a stored session when one is valid.
    pub fn new(gateway: Arc<G>, durable: Arc<dyn ClientStore>, search_debounce: Duration) -> Self {
        let sessions = SessionStore::new(Arc::clone(&durable));
        let session = match sessions.load() {
            Stored::Present(session) => {
                info!(user = session.user.username.as_str(), "restored session");
                Some(session)
            }
            Stored::Invalid => {
                warn!("stored session was invalid; starting signed out");
                None
            }
            Stored::Absent => None,
        };
        Self {
            search: QueryDispatcher::new(Arc::clone(&gateway), search_debounce),
            gateway,
            sessions,
            viewed: ViewedSnippets::new(durable),
            session,
            cache: SnippetCache::new(),
            filters: TagFilterAggregator::new(),
            view: View::default(),
            collections: Vec::new(),
            selected_collection: None,
            statuses: VecDeque::with_capacity(STATUS_LIMIT),
            needs_login: false,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Set after an authentication failure until the next login.
    pub fn needs_login(&self) -> bool {
        self.needs_login
    }

    pub fn cache(&self) -> &SnippetCache {
        &self.cache
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn filters(&self) -> &TagFilterAggregator {
        &self.filters
    }

    pub fn search_query(&self) -> &str {
        self.search.query()
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn selected_collection(&self) -> Option<&Collection> {
        self.selected_collection.as_ref()
    }

    /// Snippets rendered by the active view.
    pub fn visible_snippets(&self) -> Vec<&Snippet> {
        match self.view.list_source() {
            Some(ListSource::Public) => self.cache.partition(Partition::Public).iter().collect(),
            Some(ListSource::Mine) => self.cache.partition(Partition::Mine).iter().collect(),
            Some(ListSource::SearchResults) => self
                .cache
                .partition(Partition::SearchResults)
                .iter()
                .collect(),
            Some(ListSource::Collection) => self
                .selected_collection
                .as_ref()
                .map(|c| c.populated_snippets().collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// What the current viewer may do with snippet `id`.
    pub fn permissions(&self, id: &str) -> SnippetPermissions {
        let viewer = self.session.as_ref().map(Session::viewer);
        self.cache
            .find(id)
            .map(|snippet| snippet.permissions_for(viewer))
            .unwrap_or_default()
    }

    pub fn statuses(&self) -> impl Iterator<Item = &StatusMessage> {
        self.statuses.iter()
    }

    pub fn take_statuses(&mut self) -> Vec<StatusMessage> {
        self.statuses.drain(..).collect()
    }

    /// Switch views. Views behind login are refused while signed out.
    pub fn navigate(&mut self, view: View) -> AppResult<()> {
        if view.requires_session() && self.session.is_none() {
            self.needs_login = true;
            self.set_status(StatusLevel::Error, "Please log in to continue");
            return Err(FailureAction::ReLogin);
        }
        if !matches!(view, View::CollectionDetail(_)) {
            self.selected_collection = None;
        }
        self.view = view;
        Ok(())
    }

    pub(crate) fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        let text = text.into();
        if let Some(last) = self.statuses.back() {
            if last.text == text && last.level == level {
                return;
            }
        }
        self.statuses.push_back(StatusMessage { level, text });
        while self.statuses.len() > STATUS_LIMIT {
            self.statuses.pop_front();
        }
    }

    /// Refuse input before any gateway call.
    fn reject(&mut self, message: &str) -> FailureAction {
        self.set_status(StatusLevel::Error, message);
        FailureAction::ShowMessage(message.to_string())
    }

    /// The session, or a re-login failure when signed out.
    fn require_session(&mut self, op: &'static str) -> AppResult<Session> {
        match &self.session {
            Some(session) => Ok(session.clone()),
            None => Err(self.fail(op, GatewayError::NoSession)),
        }
    }

    /// Classify a failed call and apply its client-side reaction.
    ///
    /// Only an authentication failure changes state here: it drops the session
    /// and everything scoped to it. Other failures leave the cache as it was.
    fn fail(&mut self, op: &'static str, err: GatewayError) -> FailureAction {
        let action = err.classify();
        self.react(op, &err, action)
    }

    fn react(
        &mut self,
        op: &'static str,
        err: &GatewayError,
        action: FailureAction,
    ) -> FailureAction {
        warn!(op, "request failed: {}", err);
        match &action {
            FailureAction::ReLogin => {
                self.clear_session();
                self.set_status(StatusLevel::Error, action.to_string());
            }
            FailureAction::Notice(message) | FailureAction::ShowMessage(message) => {
                self.set_status(StatusLevel::Error, message.clone());
            }
            FailureAction::AdminReLogin => {}
        }
        action
    }

    fn clear_session(&mut self) {
        if self.session.take().is_some() {
            info!("clearing user session");
        }
        if let Err(err) = self.sessions.clear() {
            warn!("failed to clear stored session: {}", err);
        }
        self.needs_login = true;
        self.drop_user_state();
    }

    /// Forget everything that belongs to the signed-in user.
    fn drop_user_state(&mut self) {
        self.cache.clear_partition(Partition::Mine);
        self.collections.clear();
        self.selected_collection = None;
        if self.view.requires_session() {
            self.view = View::Home;
        }
    }
}
