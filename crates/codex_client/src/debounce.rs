//! Debounced query dispatcher for free-text search.
//!
//! Every submitted query bumps a generation counter, aborts the previously
//! scheduled task and schedules a new one after the quiet interval. Events
//! carry the generation that produced them; anything older than the latest
//! submission is dropped on receipt, so the last issued query always wins.

use crate::cache::{Partition, SnippetCache};
use crate::error::GatewayError;
use crate::gateway::SnippetGateway;
use codex_core::models::snippet::Snippet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Where the query stream is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPhase {
    #[default]
    Idle,
    /// Waiting for the quiet interval to elapse.
    Pending,
    /// Request in flight.
    Dispatched,
}

/// Message from a dispatch task back to the owner.
#[derive(Debug)]
pub enum SearchEvent {
    Results {
        generation: u64,
        query: String,
        items: Vec<Snippet>,
    },
    /// Blank query; results should be cleared.
    Cleared { generation: u64 },
    Failed {
        generation: u64,
        query: String,
        error: GatewayError,
    },
}

impl SearchEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Results { generation, .. }
            | Self::Cleared { generation }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}

/// What applying a current event did to the cache.
#[derive(Debug)]
pub enum SearchOutcome {
    Results { query: String, count: usize },
    Cleared,
    /// The request failed; cached results were left as they were.
    Failed { query: String, error: GatewayError },
}

/// Counters for debugging search behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub submitted: u64,
    pub requests_sent: u64,
    pub stale_drops: u64,
    pub applied: u64,
}

fn lock_phase(phase: &Mutex<DispatchPhase>) -> MutexGuard<'_, DispatchPhase> {
    match phase.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Coalesces query changes into at most one request per quiet period.
///
/// Must be used from within a tokio runtime.
pub struct QueryDispatcher<G> {
    gateway: Arc<G>,
    interval: Duration,
    query: String,
    latest: Arc<AtomicU64>,
    sent: Arc<AtomicU64>,
    phase: Arc<Mutex<DispatchPhase>>,
    pending: Option<JoinHandle<()>>,
    events_tx: UnboundedSender<SearchEvent>,
    events_rx: UnboundedReceiver<SearchEvent>,
    stats: SearchStats,
}

impl<G> QueryDispatcher<G>
where
    G: SnippetGateway + 'static,
{
    pub fn new(gateway: Arc<G>, interval: Duration) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            gateway,
            interval,
            query: String::new(),
            latest: Arc::new(AtomicU64::new(0)),
            sent: Arc::new(AtomicU64::new(0)),
            phase: Arc::new(Mutex::new(DispatchPhase::Idle)),
            pending: None,
            events_tx,
            events_rx,
            stats: SearchStats::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The most recently submitted query.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> DispatchPhase {
        *lock_phase(&self.phase)
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            requests_sent: self.sent.load(Ordering::SeqCst),
            ..self.stats
        }
    }

    /// Record `query` as pending and (re)start the quiet interval.
    ///
    /// # Returns
    /// The generation assigned to this submission.
    pub fn submit(&mut self, query: &str) -> u64 {
        self.abort_pending();
        self.query = query.to_string();
        self.stats.submitted += 1;
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        *lock_phase(&self.phase) = DispatchPhase::Pending;

        let gateway = Arc::clone(&self.gateway);
        let latest = Arc::clone(&self.latest);
        let sent = Arc::clone(&self.sent);
        let phase = Arc::clone(&self.phase);
        let events = self.events_tx.clone();
        let interval = self.interval;
        let query = query.trim().to_string();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }
            if query.is_empty() {
                let _ = events.send(SearchEvent::Cleared { generation });
                return;
            }
            *lock_phase(&phase) = DispatchPhase::Dispatched;
            sent.fetch_add(1, Ordering::SeqCst);
            debug!(generation, query = query.as_str(), "dispatching search");
            let event = match gateway.search(&query).await {
                Ok(items) => SearchEvent::Results {
                    generation,
                    query,
                    items,
                },
                Err(error) => SearchEvent::Failed {
                    generation,
                    query,
                    error,
                },
            };
            let _ = events.send(event);
        }));
        generation
    }

    /// Drop the pending query without dispatching anything.
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.latest.fetch_add(1, Ordering::SeqCst);
        self.query.clear();
        *lock_phase(&self.phase) = DispatchPhase::Idle;
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Apply every event that is ready right now.
    ///
    /// # Returns
    /// The outcome of the newest current event, if any arrived.
    pub fn poll(&mut self, cache: &mut SnippetCache) -> Option<SearchOutcome> {
        let mut outcome = None;
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(applied) = self.apply(cache, event) {
                outcome = Some(applied);
            }
        }
        outcome
    }

    /// Wait for the current submission to resolve and apply it.
    ///
    /// Returns `None` immediately when nothing is pending.
    pub async fn settle(&mut self, cache: &mut SnippetCache) -> Option<SearchOutcome> {
        while self.phase() != DispatchPhase::Idle {
            let event = self.events_rx.recv().await?;
            if let Some(applied) = self.apply(cache, event) {
                return Some(applied);
            }
        }
        None
    }

    fn apply(&mut self, cache: &mut SnippetCache, event: SearchEvent) -> Option<SearchOutcome> {
        let latest = self.latest.load(Ordering::SeqCst);
        if event.generation() != latest {
            self.stats.stale_drops += 1;
            debug!(
                generation = event.generation(),
                latest, "dropping stale search response"
            );
            return None;
        }
        *lock_phase(&self.phase) = DispatchPhase::Idle;
        self.pending = None;
        self.stats.applied += 1;
        let outcome = match event {
            SearchEvent::Results { query, items, .. } => {
                let count = items.len();
                cache.replace_partition(Partition::SearchResults, items);
                SearchOutcome::Results { query, count }
            }
            SearchEvent::Cleared { .. } => {
                cache.clear_partition(Partition::SearchResults);
                SearchOutcome::Cleared
            }
            SearchEvent::Failed { query, error, .. } => {
                warn!(query = query.as_str(), "search failed: {}", error);
                SearchOutcome::Failed { query, error }
            }
        };
        Some(outcome)
    }
}

impl<G> Drop for QueryDispatcher<G> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
