//! Client state and gateway access for Codex.
//!
//! The gateway module talks to the backend; everything else is client-side
//! state kept consistent with the gateway's confirmed responses.

/// Admin console over the key-authenticated admin surface.
pub mod admin;
/// Tag filter aggregation into the search-results partition.
pub mod aggregator;
/// Client state controller.
pub mod app;
/// Per-view snippet lists and the selected snippet.
pub mod cache;
/// Debounced free-text search.
pub mod debounce;
/// Gateway errors and their client-side reactions.
pub mod error;
/// Active tag filter set.
pub mod filters;
/// Backend REST surface.
pub mod gateway;
/// Propagation of confirmed mutations across the cache.
pub mod sync;

#[cfg(test)]
mod test_support;

pub use admin::{AdminConsole, Dashboard};
pub use aggregator::{FilterOutcome, TagFailure, TagFilterAggregator};
pub use app::{AppResult, CodexApp, StatusLevel, StatusMessage};
pub use cache::{Partition, SnippetCache};
pub use debounce::{DispatchPhase, QueryDispatcher, SearchOutcome};
pub use error::{FailureAction, GatewayError};
pub use filters::ActiveFilterSet;
pub use gateway::{
    AdminGateway, AuthGateway, CollectionGateway, Gateway, HttpGateway, LikeOutcome,
    SnippetGateway,
};
pub use sync::{apply_mutation, Mutation, SyncReport};
