//! Mutation synchronizer: applies one gateway-confirmed change to every
//! cached copy of a snippet in a single pass.
//!
//! Callers only reach this module after the gateway call succeeded, so a
//! failed request never touches the cache.

use crate::cache::{replace_existing, upsert, Partition, SnippetCache};
use codex_core::models::snippet::Snippet;
use tracing::debug;

/// A confirmed change to a snippet. Records are always complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A snippet created by the current user.
    Created(Snippet),
    /// A fork owned by the current user.
    Forked(Snippet),
    /// Edit, like, comment, view or sync result for an existing snippet.
    Updated(Snippet),
    Deleted(String),
}

impl Mutation {
    pub fn snippet_id(&self) -> &str {
        match self {
            Self::Created(s) | Self::Forked(s) | Self::Updated(s) => s.id.as_str(),
            Self::Deleted(id) => id.as_str(),
        }
    }
}

/// Which parts of the cache a mutation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub partitions: Vec<Partition>,
    pub selected: bool,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty() && !self.selected
    }
}

/// Apply `mutation` to `cache` as one state transition.
pub fn apply_mutation(cache: &mut SnippetCache, mutation: Mutation) -> SyncReport {
    let id = mutation.snippet_id().to_string();
    let report = match mutation {
        Mutation::Created(snippet) | Mutation::Forked(snippet) => insert_owned(cache, snippet),
        Mutation::Updated(snippet) => propagate_update(cache, snippet),
        Mutation::Deleted(id) => remove_everywhere(cache, &id),
    };
    cache.bump();
    debug!(
        snippet_id = id.as_str(),
        partitions = ?report.partitions,
        selected = report.selected,
        revision = cache.revision(),
        "applied snippet mutation"
    );
    report
}

fn insert_owned(cache: &mut SnippetCache, snippet: Snippet) -> SyncReport {
    let mut report = SyncReport::default();
    if snippet.visibility.is_public() {
        upsert(cache.partition_mut(Partition::Public), snippet.clone());
        report.partitions.push(Partition::Public);
    }
    if replace_existing(cache.partition_mut(Partition::SearchResults), &snippet) {
        report.partitions.push(Partition::SearchResults);
    }
    upsert(cache.partition_mut(Partition::Mine), snippet);
    report.partitions.push(Partition::Mine);
    report
}

fn propagate_update(cache: &mut SnippetCache, snippet: Snippet) -> SyncReport {
    let mut report = SyncReport::default();
    for partition in Partition::ALL {
        let list = cache.partition_mut(partition);
        if partition == Partition::Public && !snippet.visibility.is_public() {
            // Private snippets leave the public feed.
            let before = list.len();
            list.retain(|s| s.id != snippet.id);
            if list.len() != before {
                report.partitions.push(partition);
            }
            continue;
        }
        if replace_existing(list, &snippet) {
            report.partitions.push(partition);
        }
    }
    let selected = cache.selected_mut();
    if selected.as_ref().is_some_and(|s| s.id == snippet.id) {
        *selected = Some(snippet);
        report.selected = true;
    }
    report
}

fn remove_everywhere(cache: &mut SnippetCache, id: &str) -> SyncReport {
    let mut report = SyncReport::default();
    for partition in Partition::ALL {
        let list = cache.partition_mut(partition);
        let before = list.len();
        list.retain(|s| s.id != id);
        if list.len() != before {
            report.partitions.push(partition);
        }
    }
    let selected = cache.selected_mut();
    if selected.as_ref().is_some_and(|s| s.id == id) {
        *selected = None;
        report.selected = true;
    }
    report
}
