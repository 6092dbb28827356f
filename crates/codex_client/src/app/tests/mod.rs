//! Controller tests driving `CodexApp` against the in-memory gateway.

use super::*;
use crate::test_support::{owned_snippet, session, snippet, FakeFailure, FakeGateway};
use codex_core::MemoryStore;

struct TestHarness {
    app: CodexApp<FakeGateway>,
    gateway: Arc<FakeGateway>,
    store: Arc<MemoryStore>,
}

impl TestHarness {
    /// A second controller sharing this harness's gateway and durable store,
    /// as after a restart.
    fn reopen(&self) -> CodexApp<FakeGateway> {
        let durable: Arc<dyn ClientStore> = self.store.clone();
        CodexApp::new(Arc::clone(&self.gateway), durable, Duration::from_millis(350))
    }

    fn sessions(&self) -> SessionStore {
        SessionStore::new(self.store.clone())
    }
}

fn make_app() -> TestHarness {
    let gateway = Arc::new(FakeGateway::new());
    let store = Arc::new(MemoryStore::new());
    let durable: Arc<dyn ClientStore> = store.clone();
    let app = CodexApp::new(Arc::clone(&gateway), durable, Duration::from_millis(350));
    TestHarness {
        app,
        gateway,
        store,
    }
}

fn signed_in_app() -> TestHarness {
    let store = Arc::new(MemoryStore::new());
    SessionStore::new(store.clone())
        .save(&session())
        .expect("save session");
    let gateway = Arc::new(FakeGateway::new());
    let durable: Arc<dyn ClientStore> = store.clone();
    let app = CodexApp::new(Arc::clone(&gateway), durable, Duration::from_millis(350));
    assert!(app.is_signed_in());
    TestHarness {
        app,
        gateway,
        store,
    }
}

/// Public feed [S1, S2, S3], own list [S1, M1], both loaded into the cache.
async fn seeded_app() -> TestHarness {
    let mut harness = signed_in_app();
    harness.gateway.set_public(vec![
        owned_snippet("S1", "u1"),
        snippet("S2"),
        snippet("S3"),
    ]);
    harness
        .gateway
        .set_mine(vec![owned_snippet("S1", "u1"), owned_snippet("M1", "u1")]);
    harness.app.refresh().await.expect("refresh");
    harness
}

fn ids(app: &CodexApp<FakeGateway>, partition: Partition) -> Vec<String> {
    app.cache()
        .partition(partition)
        .iter()
        .map(|s| s.id.clone())
        .collect()
}
