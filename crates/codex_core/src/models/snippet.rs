//! Snippet and comment models as returned by the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserRef;

/// Whether a snippet is listed in the public feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    /// Map the gateway's `isPublic` flag onto a visibility.
    pub fn from_flag(is_public: bool) -> Self {
        if is_public {
            Self::Public
        } else {
            Self::Private
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

mod visibility_flag {
    use super::Visibility;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Visibility, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(value.is_public())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Visibility, D::Error> {
        Ok(Visibility::from_flag(bool::deserialize(deserializer)?))
    }
}

/// Owner reference; the gateway sends either a bare id or a populated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerRef {
    Id(String),
    User(UserRef),
}

impl OwnerRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id.as_str(),
            Self::User(user) => user.id.as_str(),
        }
    }

    /// Display name when the owner was populated by the gateway.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::User(user) => user.username.as_deref(),
        }
    }
}

/// A comment attached to a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A stored unit of code plus metadata.
///
/// Gateway responses always carry the full post-mutation record, so a
/// `Snippet` value is treated as authoritative wherever it is cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "isPublic", with = "visibility_flag", default)]
    pub visibility: Visibility,
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub views: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gist_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Snippet {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner.as_ref().map(OwnerRef::id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id() == Some(user_id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// Capabilities of `viewer` (id + username) on this snippet.
    ///
    /// `None` means an anonymous reader: they can only view.
    pub fn permissions_for(&self, viewer: Option<(&str, &str)>) -> SnippetPermissions {
        let Some((user_id, _)) = viewer else {
            return SnippetPermissions::default();
        };
        let is_owner = self.is_owned_by(user_id);
        SnippetPermissions {
            can_edit: is_owner,
            can_delete: is_owner,
            can_sync_gist: is_owner,
            can_like: true,
            can_comment: true,
            can_fork: true,
        }
    }

    /// Comment author or snippet owner may delete a comment.
    pub fn can_delete_comment(&self, comment_id: &str, viewer: (&str, &str)) -> bool {
        let (user_id, username) = viewer;
        if self.is_owned_by(user_id) {
            return self.comment(comment_id).is_some();
        }
        self.comment(comment_id)
            .map(|c| !c.username.is_empty() && c.username == username)
            .unwrap_or(false)
    }
}

/// What a viewer may do with a given snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnippetPermissions {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_sync_gist: bool,
    pub can_like: bool,
    pub can_comment: bool,
    pub can_fork: bool,
}

/// Request payload for creating a snippet.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnippetRequest {
    pub title: String,
    pub description: String,
    pub language: String,
    pub code: String,
    pub tags: Vec<String>,
    pub is_public: bool,
}

/// Request payload for updating a snippet; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSnippetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// Response of a gist sync; the backend may include the updated snippet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GistSyncResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "url")]
    pub gist_url: Option<String>,
    #[serde(default)]
    pub snippet: Option<Snippet>,
}

/// Split a comma separated tag list, trimming and dropping empty entries.
pub fn parse_tags_csv(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Normalize a language tag for display/filter comparison.
pub fn normalize_language(language: Option<&str>) -> Option<String> {
    language
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_ascii_lowercase())
}
