//! Closed set of application views.

use std::fmt;

/// Which screen the client is showing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Home,
    Add,
    MySnippets,
    Collections,
    Profile,
    Search,
    CollectionDetail(String),
}

/// Snippet list rendered by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListSource {
    Public,
    Mine,
    SearchResults,
    Collection,
}

impl View {
    pub fn list_source(&self) -> Option<ListSource> {
        match self {
            Self::Home => Some(ListSource::Public),
            Self::MySnippets => Some(ListSource::Mine),
            Self::Search => Some(ListSource::SearchResults),
            Self::CollectionDetail(_) => Some(ListSource::Collection),
            Self::Add | Self::Collections | Self::Profile => None,
        }
    }

    /// Whether the view is only reachable with a signed-in session.
    pub fn requires_session(&self) -> bool {
        match self {
            Self::Home | Self::Search => false,
            Self::Add
            | Self::MySnippets
            | Self::Collections
            | Self::Profile
            | Self::CollectionDetail(_) => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Add => "Add Snippet",
            Self::MySnippets => "My Snippets",
            Self::Collections => "Collections",
            Self::Profile => "Profile",
            Self::Search => "Search",
            Self::CollectionDetail(_) => "Collection",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollectionDetail(id) => write!(f, "{} {}", self.label(), id),
            other => f.write_str(other.label()),
        }
    }
}
