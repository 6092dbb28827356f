//! Snippet reads and mutations.

use super::{AppResult, CodexApp, StatusLevel};
use crate::cache::Partition;
use crate::gateway::{Gateway, LikeOutcome};
use crate::sync::{apply_mutation, Mutation, SyncReport};
use codex_core::models::collection::CollectionEntry;
use codex_core::models::snippet::{CreateSnippetRequest, Snippet, UpdateSnippetRequest};
use codex_core::View;
use tracing::{debug, warn};

impl<G: Gateway + 'static> CodexApp<G> {
    /// Reload the public feed, and the user's own list when signed in.
    pub async fn refresh(&mut self) -> AppResult<()> {
        let public = match self.gateway.list_public().await {
            Ok(items) => items,
            Err(err) => return Err(self.fail("list_public", err)),
        };
        self.cache.replace_partition(Partition::Public, public);

        let Some(session) = self.session.clone() else {
            return Ok(());
        };
        match self.gateway.list_mine(&session).await {
            Ok(items) => {
                self.cache.replace_partition(Partition::Mine, items);
                Ok(())
            }
            Err(err) => Err(self.fail("list_mine", err)),
        }
    }

    /// Fetch and select a snippet, counting the view once per client.
    pub async fn open_snippet(&mut self, id: &str) -> AppResult<Snippet> {
        let snippet = match self.gateway.get_snippet(id).await {
            Ok(snippet) => snippet,
            Err(err) => return Err(self.fail("get_snippet", err)),
        };
        self.cache.select(snippet.clone());
        self.record_view_once(id).await;
        Ok(snippet)
    }

    async fn record_view_once(&mut self, id: &str) {
        if self.viewed.contains(id) {
            debug!(snippet_id = id, "view already counted");
            return;
        }
        // Only remember the view once the gateway has counted it.
        if let Err(err) = self.gateway.record_view(id).await {
            warn!(snippet_id = id, "view record failed: {}", err);
            return;
        }
        if let Err(err) = self.viewed.mark(id) {
            warn!(snippet_id = id, "failed to persist viewed snippet: {}", err);
        }
    }

    pub fn close_snippet(&mut self) {
        self.cache.clear_selection();
    }

    pub async fn create_snippet(&mut self, request: CreateSnippetRequest) -> AppResult<Snippet> {
        let session = self.require_session("create_snippet")?;
        if request.title.trim().is_empty() || request.code.trim().is_empty() {
            return Err(self.reject("Title and code are required"));
        }
        let created = match self.gateway.create_snippet(&session, &request).await {
            Ok(snippet) => snippet,
            Err(err) => return Err(self.fail("create_snippet", err)),
        };
        self.sync(Mutation::Created(created.clone()));
        if self.view == View::Add {
            self.view = View::MySnippets;
        }
        self.set_status(StatusLevel::Info, format!("Created \"{}\"", created.title));
        Ok(created)
    }

    pub async fn update_snippet(
        &mut self,
        id: &str,
        request: UpdateSnippetRequest,
    ) -> AppResult<Snippet> {
        let session = self.require_session("update_snippet")?;
        match self.gateway.update_snippet(&session, id, &request).await {
            Ok(updated) => {
                self.sync(Mutation::Updated(updated.clone()));
                self.set_status(StatusLevel::Info, "Snippet updated");
                Ok(updated)
            }
            Err(err) => Err(self.fail("update_snippet", err)),
        }
    }

    pub async fn delete_snippet(&mut self, id: &str) -> AppResult<()> {
        let session = self.require_session("delete_snippet")?;
        if let Err(err) = self.gateway.delete_snippet(&session, id).await {
            return Err(self.fail("delete_snippet", err));
        }
        self.sync(Mutation::Deleted(id.to_string()));
        self.forget_in_collections(id);
        self.set_status(StatusLevel::Info, "Snippet deleted");
        Ok(())
    }

    /// Like or unlike `id` for the signed-in user.
    ///
    /// A like-set-only response is merged onto the cached record; when the
    /// snippet is not cached the gateway result is accepted without a sync.
    pub async fn toggle_like(&mut self, id: &str) -> AppResult<Vec<String>> {
        let session = self.require_session("toggle_like")?;
        let outcome = match self.gateway.toggle_like(&session, id).await {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.fail("toggle_like", err)),
        };
        let (likes, updated) = match outcome {
            LikeOutcome::Snippet(snippet) => (snippet.likes.clone(), Some(snippet)),
            LikeOutcome::Likes(likes) => {
                let merged = self.cache.find(id).cloned().map(|mut snippet| {
                    snippet.likes = likes.clone();
                    snippet
                });
                (likes, merged)
            }
        };
        match updated {
            Some(snippet) => {
                self.sync(Mutation::Updated(snippet));
            }
            None => debug!(snippet_id = id, "liked snippet is not cached"),
        }
        Ok(likes)
    }

    pub async fn add_comment(&mut self, id: &str, text: &str) -> AppResult<Snippet> {
        let session = self.require_session("add_comment")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject("Comment cannot be empty"));
        }
        match self.gateway.add_comment(&session, id, text).await {
            Ok(updated) => {
                self.sync(Mutation::Updated(updated.clone()));
                Ok(updated)
            }
            Err(err) => Err(self.fail("add_comment", err)),
        }
    }

    pub async fn delete_comment(&mut self, id: &str, comment_id: &str) -> AppResult<Snippet> {
        let session = self.require_session("delete_comment")?;
        let allowed = self
            .cache
            .find(id)
            .map(|snippet| snippet.can_delete_comment(comment_id, session.viewer()))
            .unwrap_or(true);
        if !allowed {
            return Err(self.reject("Only the comment author or snippet owner can delete it"));
        }
        match self.gateway.delete_comment(&session, id, comment_id).await {
            Ok(updated) => {
                self.sync(Mutation::Updated(updated.clone()));
                Ok(updated)
            }
            Err(err) => Err(self.fail("delete_comment", err)),
        }
    }

    /// Copy `id` into the user's own snippets.
    pub async fn fork_snippet(&mut self, id: &str) -> AppResult<Snippet> {
        let session = self.require_session("fork_snippet")?;
        match self.gateway.fork_snippet(&session, id).await {
            Ok(fork) => {
                self.sync(Mutation::Forked(fork.clone()));
                self.set_status(StatusLevel::Info, format!("Forked \"{}\"", fork.title));
                Ok(fork)
            }
            Err(err) => Err(self.fail("fork_snippet", err)),
        }
    }

    /// Push `id` to a Gist and record the returned URL.
    pub async fn sync_to_gist(&mut self, id: &str) -> AppResult<Option<String>> {
        let session = self.require_session("sync_gist")?;
        let response = match self.gateway.sync_gist(&session, id).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail("sync_gist", err)),
        };
        let url = response
            .gist_url
            .clone()
            .or_else(|| response.snippet.as_ref().and_then(|s| s.gist_url.clone()));
        let updated = match response.snippet {
            Some(snippet) => Some(snippet),
            None => self.cache.find(id).cloned().map(|mut snippet| {
                snippet.gist_url = url.clone();
                snippet
            }),
        };
        if let Some(snippet) = updated {
            self.sync(Mutation::Updated(snippet));
        }
        let message = response
            .message
            .unwrap_or_else(|| "Synced to GitHub Gist".to_string());
        self.set_status(StatusLevel::Info, message);
        Ok(url)
    }

    fn sync(&mut self, mutation: Mutation) -> SyncReport {
        if let (Mutation::Updated(snippet), Some(collection)) =
            (&mutation, self.selected_collection.as_mut())
        {
            // Populated copies in an open collection follow edits too.
            for entry in &mut collection.snippets {
                if let CollectionEntry::Snippet(existing) = entry {
                    if existing.id == snippet.id {
                        **existing = snippet.clone();
                    }
                }
            }
        }
        apply_mutation(&mut self.cache, mutation)
    }

    fn forget_in_collections(&mut self, id: &str) {
        for collection in &mut self.collections {
            collection.snippets.retain(|entry| entry.snippet_id() != id);
        }
        if let Some(collection) = self.selected_collection.as_mut() {
            collection.snippets.retain(|entry| entry.snippet_id() != id);
        }
    }
}
