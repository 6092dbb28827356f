//! Collection models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snippet::{OwnerRef, Snippet};

/// A collection entry is either a bare snippet id or a populated snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionEntry {
    Id(String),
    Snippet(Box<Snippet>),
}

impl CollectionEntry {
    pub fn snippet_id(&self) -> &str {
        match self {
            Self::Id(id) => id.as_str(),
            Self::Snippet(snippet) => snippet.id.as_str(),
        }
    }
}

/// A user-owned named grouping of snippet references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub snippets: Vec<CollectionEntry>,
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Collection {
    pub fn contains(&self, snippet_id: &str) -> bool {
        self.snippets.iter().any(|e| e.snippet_id() == snippet_id)
    }

    /// Populated snippets only; bare ids are skipped.
    pub fn populated_snippets(&self) -> impl Iterator<Item = &Snippet> {
        self.snippets.iter().filter_map(|entry| match entry {
            CollectionEntry::Snippet(snippet) => Some(snippet.as_ref()),
            CollectionEntry::Id(_) => None,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSnippetRequest {
    pub snippet_id: String,
}
