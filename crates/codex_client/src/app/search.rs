//! Tag filters and debounced free-text search.

use super::{AppResult, CodexApp, StatusLevel};
use crate::aggregator::FilterOutcome;
use crate::debounce::SearchOutcome;
use crate::gateway::Gateway;
use codex_core::View;

impl<G: Gateway + 'static> CodexApp<G> {
    /// Flip `tag` in the active filter set and refresh search results.
    ///
    /// Tag queries that fail are reported as a status line; the rest of the
    /// results are still shown.
    pub async fn toggle_tag(&mut self, tag: &str) -> FilterOutcome {
        self.search.cancel();
        let outcome = self
            .filters
            .toggle_tag(self.gateway.as_ref(), &mut self.cache, &mut self.view, tag)
            .await;
        self.report_filter_outcome(&outcome);
        outcome
    }

    pub async fn remove_filter(&mut self, tag: &str) -> FilterOutcome {
        self.search.cancel();
        let outcome = self
            .filters
            .remove_tag(self.gateway.as_ref(), &mut self.cache, &mut self.view, tag)
            .await;
        self.report_filter_outcome(&outcome);
        outcome
    }

    /// Drop every tag filter and return to the home feed.
    pub fn clear_filters(&mut self) -> FilterOutcome {
        self.search.cancel();
        self.selected_collection = None;
        self.filters.clear(&mut self.cache, &mut self.view)
    }

    fn report_filter_outcome(&mut self, outcome: &FilterOutcome) {
        if let FilterOutcome::Applied { failed, .. } = outcome {
            if !failed.is_empty() {
                let tags: Vec<&str> = failed.iter().map(|f| f.tag.as_str()).collect();
                self.set_status(
                    StatusLevel::Error,
                    format!("Some tags could not be loaded: {}", tags.join(", ")),
                );
            }
        }
    }

    /// Record a new free-text query; the request fires after the quiet
    /// interval unless another query supersedes it.
    ///
    /// Typing a query drops any active tag filters; the search owns the
    /// results from here on.
    pub fn set_search_query(&mut self, query: &str) {
        self.filters.forget();
        self.search.submit(query);
    }

    /// Apply any search response that has arrived.
    pub fn poll_search(&mut self) -> Option<AppResult<SearchOutcome>> {
        let outcome = self.search.poll(&mut self.cache)?;
        Some(self.finish_search(outcome))
    }

    /// Wait for the pending search, if any, and apply it.
    pub async fn settle_search(&mut self) -> Option<AppResult<SearchOutcome>> {
        let outcome = self.search.settle(&mut self.cache).await?;
        Some(self.finish_search(outcome))
    }

    fn finish_search(&mut self, outcome: SearchOutcome) -> AppResult<SearchOutcome> {
        match outcome {
            SearchOutcome::Results { .. } => {
                self.selected_collection = None;
                self.view = View::Search;
                Ok(outcome)
            }
            SearchOutcome::Cleared => {
                if self.view == View::Search {
                    self.view = View::Home;
                }
                Ok(outcome)
            }
            SearchOutcome::Failed { error, .. } => Err(self.fail("search", error)),
        }
    }
}
