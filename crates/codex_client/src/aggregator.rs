//! Tag filter aggregator: keeps the search-results partition in step with
//! the active tag filter set.

use crate::cache::{dedupe_by_id, Partition, SnippetCache};
use crate::filters::ActiveFilterSet;
use crate::gateway::SnippetGateway;
use codex_core::models::snippet::Snippet;
use codex_core::View;
use futures::future::join_all;
use tracing::{debug, warn};

/// A tag query that failed and contributed no results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFailure {
    pub tag: String,
    pub message: String,
}

/// Result of re-running the filter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The set became empty; results cleared and the view reset to home.
    Cleared,
    Applied {
        results: usize,
        failed: Vec<TagFailure>,
    },
    /// Blank tag input; nothing changed.
    Ignored,
}

/// Query every tag concurrently and merge the lists.
///
/// Lists are concatenated in `tags` order (not completion order) and
/// deduplicated keeping the first occurrence, so the merge is deterministic.
pub async fn collect_tag_results<G: SnippetGateway>(
    gateway: &G,
    tags: &[String],
) -> (Vec<Snippet>, Vec<TagFailure>) {
    let queries = tags.iter().map(|tag| async move {
        let result = gateway.snippets_by_tag(tag).await;
        (tag, result)
    });

    let mut merged = Vec::new();
    let mut failed = Vec::new();
    for (tag, result) in join_all(queries).await {
        match result {
            Ok(items) => merged.extend(items),
            Err(err) => {
                warn!(tag = tag.as_str(), "tag query failed; continuing without it: {}", err);
                failed.push(TagFailure {
                    tag: tag.clone(),
                    message: err.to_string(),
                });
            }
        }
    }
    (dedupe_by_id(merged), failed)
}

/// Owns the active filter set and republishes merged tag results.
#[derive(Debug, Clone, Default)]
pub struct TagFilterAggregator {
    filters: ActiveFilterSet,
}

impl TagFilterAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &ActiveFilterSet {
        &self.filters
    }

    /// Flip `tag` in the filter set and refresh search results.
    pub async fn toggle_tag<G: SnippetGateway>(
        &mut self,
        gateway: &G,
        cache: &mut SnippetCache,
        view: &mut View,
        tag: &str,
    ) -> FilterOutcome {
        if self.filters.toggle(tag).is_none() {
            return FilterOutcome::Ignored;
        }
        self.apply(gateway, cache, view).await
    }

    /// Drop `tag` from the filter set and refresh search results.
    pub async fn remove_tag<G: SnippetGateway>(
        &mut self,
        gateway: &G,
        cache: &mut SnippetCache,
        view: &mut View,
        tag: &str,
    ) -> FilterOutcome {
        if !self.filters.remove(tag) {
            return FilterOutcome::Ignored;
        }
        self.apply(gateway, cache, view).await
    }

    /// Forget the active tags but leave the cached results alone.
    pub fn forget(&mut self) {
        self.filters.clear();
    }

    /// Empty the filter set without any network call.
    pub fn clear(&mut self, cache: &mut SnippetCache, view: &mut View) -> FilterOutcome {
        self.filters.clear();
        cache.clear_partition(Partition::SearchResults);
        *view = View::Home;
        FilterOutcome::Cleared
    }

    /// Re-run the current filter set against the gateway.
    pub async fn apply<G: SnippetGateway>(
        &mut self,
        gateway: &G,
        cache: &mut SnippetCache,
        view: &mut View,
    ) -> FilterOutcome {
        if self.filters.is_empty() {
            return self.clear(cache, view);
        }
        let (results, failed) = collect_tag_results(gateway, self.filters.as_slice()).await;
        debug!(
            tags = ?self.filters.as_slice(),
            results = results.len(),
            failed = failed.len(),
            "applied tag filters"
        );
        let count = results.len();
        cache.replace_partition(Partition::SearchResults, results);
        *view = View::Search;
        FilterOutcome::Applied {
            results: count,
            failed,
        }
    }
}
