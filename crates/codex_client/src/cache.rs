//! Local snippet cache: per-view snippet lists plus the open snippet.
//!
//! Invariant: an id appears at most once per partition. Every write path
//! goes through [`upsert`] or [`dedupe_by_id`] to keep it that way.

use codex_core::models::snippet::Snippet;
use std::collections::HashSet;

/// Named in-memory snippet list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Public,
    Mine,
    SearchResults,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Self::Public, Self::Mine, Self::SearchResults];
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Replace in place when `snippet.id` is present, otherwise prepend.
pub(crate) fn upsert(list: &mut Vec<Snippet>, snippet: Snippet) -> Upsert {
    match list.iter().position(|s| s.id == snippet.id) {
        Some(index) => {
            list[index] = snippet;
            Upsert::Replaced
        }
        None => {
            list.insert(0, snippet);
            Upsert::Inserted
        }
    }
}

/// Replace in place only; absent ids are ignored.
pub(crate) fn replace_existing(list: &mut [Snippet], snippet: &Snippet) -> bool {
    match list.iter_mut().find(|s| s.id == snippet.id) {
        Some(slot) => {
            *slot = snippet.clone();
            true
        }
        None => false,
    }
}

/// Keep the first occurrence of each id, preserving order.
pub fn dedupe_by_id(items: Vec<Snippet>) -> Vec<Snippet> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|snippet| seen.insert(snippet.id.clone()))
        .collect()
}

/// The three snippet lists and the selected snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetCache {
    public: Vec<Snippet>,
    mine: Vec<Snippet>,
    search_results: Vec<Snippet>,
    selected: Option<Snippet>,
    revision: u64,
}

impl SnippetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition(&self, partition: Partition) -> &[Snippet] {
        match partition {
            Partition::Public => &self.public,
            Partition::Mine => &self.mine,
            Partition::SearchResults => &self.search_results,
        }
    }

    pub(crate) fn partition_mut(&mut self, partition: Partition) -> &mut Vec<Snippet> {
        match partition {
            Partition::Public => &mut self.public,
            Partition::Mine => &mut self.mine,
            Partition::SearchResults => &mut self.search_results,
        }
    }

    pub fn selected(&self) -> Option<&Snippet> {
        self.selected.as_ref()
    }

    pub(crate) fn selected_mut(&mut self) -> &mut Option<Snippet> {
        &mut self.selected
    }

    /// Count of visible state transitions applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Look up a snippet by id, preferring the selected record.
    pub fn find(&self, id: &str) -> Option<&Snippet> {
        self.selected
            .as_ref()
            .filter(|s| s.id == id)
            .or_else(|| {
                Partition::ALL
                    .iter()
                    .find_map(|p| self.partition(*p).iter().find(|s| s.id == id))
            })
    }

    pub fn contains(&self, partition: Partition, id: &str) -> bool {
        self.partition(partition).iter().any(|s| s.id == id)
    }

    /// Insert `snippet` at the front of `partition`, or replace it in place
    /// when its id is already there.
    pub fn upsert_into_partition(&mut self, partition: Partition, snippet: Snippet) -> Upsert {
        let outcome = upsert(self.partition_mut(partition), snippet);
        self.bump();
        outcome
    }

    /// Drop `id` from every partition and clear the selection if it matches.
    ///
    /// # Returns
    /// `true` when anything was removed.
    pub fn remove_from_all_partitions(&mut self, id: &str) -> bool {
        let mut removed = false;
        for partition in Partition::ALL {
            let list = self.partition_mut(partition);
            let before = list.len();
            list.retain(|s| s.id != id);
            removed |= list.len() != before;
        }
        if self.selected.as_ref().is_some_and(|s| s.id == id) {
            self.selected = None;
            removed = true;
        }
        self.bump();
        removed
    }

    /// Replace a whole partition, dropping duplicate ids (first wins).
    pub fn replace_partition(&mut self, partition: Partition, items: Vec<Snippet>) {
        *self.partition_mut(partition) = dedupe_by_id(items);
        self.bump();
    }

    pub fn clear_partition(&mut self, partition: Partition) {
        if self.partition(partition).is_empty() {
            return;
        }
        self.partition_mut(partition).clear();
        self.bump();
    }

    pub fn select(&mut self, snippet: Snippet) {
        self.selected = Some(snippet);
        self.bump();
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.bump();
        }
    }
}
