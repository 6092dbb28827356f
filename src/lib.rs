//! Root crate facade for the Codex client libraries.

pub use codex_client::{
    admin, aggregator, app, cache, debounce, filters, gateway, sync, AdminConsole, CodexApp,
    FailureAction, GatewayError, HttpGateway, SnippetCache,
};
pub use codex_core::{config, models, session, storage, view, Config, Session, View};
