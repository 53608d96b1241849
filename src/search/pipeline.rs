//! Result Pipeline
//!
//! Background task that turns submit commands into fetches and publishes
//! the outcome.
//!
//! ```text
//!  submit ─► [debounce window] ─► fetch(current query) ─► Ready / Failed
//!               ▲   restarts on        │ dropped when a newer
//!               └── every submit       ▼ submit arrives
//! ```
//!
//! Every submit and every reset bumps a generation counter. The counter lives
//! under one lock together with the store writes and the publishing of a
//! response, so a response is only published while no newer submit or reset
//! has happened, and consumers never see a result older than the most
//! recently started request.

use crate::models::{Facets, QueryKind, QueryPatch, SearchQuery, SearchResults};
use crate::search::client::{SearchBackend, SearchError};
use crate::search::store::QueryStore;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A published search outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    /// Query the results answer
    pub query: SearchQuery,
    pub results: SearchResults,
    pub received_at: DateTime<Utc>,
}

/// What the results view should show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// A search is debouncing or in flight
    Loading,
    Ready(Arc<ResultSet>),
    Failed(String),
}

impl LoadState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Loading)
    }

    pub fn result_set(&self) -> Option<&Arc<ResultSet>> {
        match self {
            LoadState::Ready(set) => Some(set),
            _ => None,
        }
    }
}

/// Commands accepted by the pipeline task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineCommand {
    /// Fetch results for the store's current query, as of this generation
    Submit(u64),
    /// Drop the pending or in-flight search
    Cancel,
    Shutdown,
}

/// State shared between the pipeline handle and its task
struct Shared {
    store: QueryStore,
    /// Generation of the latest submit or reset
    generation: Mutex<u64>,
    state: watch::Sender<LoadState>,
    facets: watch::Sender<Facets>,
}

impl Shared {
    fn gate(&self) -> MutexGuard<'_, u64> {
        self.generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply `patch` and open a new generation
    fn begin(&self, patch: QueryPatch) -> (u64, SearchQuery) {
        let mut generation = self.gate();
        let query = self.store.update(patch);
        self.store.mark_submitted();
        *generation += 1;
        self.state.send_replace(LoadState::Loading);
        (*generation, query)
    }

    /// Restore the default query and retire every earlier generation
    fn cancel(&self) -> u64 {
        let mut generation = self.gate();
        *generation += 1;
        self.store.reset();
        self.state.send_replace(LoadState::Idle);
        *generation
    }

    /// Query to fetch for `generation`, or `None` if it has been retired
    fn snapshot(&self, generation: u64) -> Option<SearchQuery> {
        let current = self.gate();
        (*current == generation).then(|| self.store.current())
    }

    /// Publish the outcome of `generation` if it is still the latest.
    /// Returns false when the outcome was dropped.
    fn publish(
        &self,
        generation: u64,
        query: SearchQuery,
        result: Result<SearchResults, SearchError>,
    ) -> bool {
        let current = self.gate();
        if *current != generation {
            debug!(generation, current = *current, "Dropping response of a superseded search");
            return false;
        }

        match result {
            Ok(results) => {
                info!(generation, count = results.papers.len(), "Publishing results");
                // Facets reflect only the latest response
                self.facets.send_replace(results.facets.clone());
                self.store.update(QueryPatch::kind(QueryKind::FollowUp));
                self.state.send_replace(LoadState::Ready(Arc::new(ResultSet {
                    query,
                    results,
                    received_at: Utc::now(),
                })));
            }
            Err(e) => {
                warn!(generation, error = %e, "Search failed");
                self.state.send_replace(LoadState::Failed(e.to_string()));
            }
        }
        true
    }
}

/// Handle to the running pipeline task. Dropping it stops the task.
pub struct ResultPipeline {
    commands: mpsc::UnboundedSender<PipelineCommand>,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl ResultPipeline {
    /// Spawn the pipeline on the current tokio runtime
    pub fn spawn(store: QueryStore, backend: Arc<dyn SearchBackend>, debounce: Duration) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            store,
            generation: Mutex::new(0),
            state: watch::Sender::new(LoadState::Idle),
            facets: watch::Sender::new(Facets::default()),
        });

        let worker = Worker {
            backend,
            debounce,
            commands: rx,
            shared: Arc::clone(&shared),
        };
        let task = tokio::spawn(worker.run());

        Self {
            commands,
            shared,
            task,
        }
    }

    /// Merge `patch` into the store and fetch results for the outcome
    pub fn submit(&self, patch: QueryPatch) -> SearchQuery {
        let (generation, query) = self.shared.begin(patch);
        debug!(generation, "Search submitted");
        if self.commands.send(PipelineCommand::Submit(generation)).is_err() {
            warn!("Result pipeline is not running");
            self.shared
                .state
                .send_replace(LoadState::Failed("Search pipeline stopped".to_string()));
        }
        query
    }

    /// Reset the store to the default query and drop whatever is pending or
    /// in flight. The state goes back to [`LoadState::Idle`].
    pub fn reset(&self) {
        let generation = self.shared.cancel();
        debug!(generation, "Search reset");
        let _ = self.commands.send(PipelineCommand::Cancel);
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(PipelineCommand::Shutdown);
    }

    pub fn state(&self) -> LoadState {
        self.shared.state.borrow().clone()
    }

    /// Receiver that sees every published [`LoadState`]
    pub fn watch_state(&self) -> watch::Receiver<LoadState> {
        self.shared.state.subscribe()
    }

    /// Facet vocabularies from the latest successful response
    pub fn facets(&self) -> Facets {
        self.shared.facets.borrow().clone()
    }

    pub fn watch_facets(&self) -> watch::Receiver<Facets> {
        self.shared.facets.subscribe()
    }
}

impl Drop for ResultPipeline {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Outcome {
    Fetched(Result<SearchResults, SearchError>),
    Superseded(u64),
    Cancelled,
    Stop,
}

enum Quiet {
    /// Window elapsed; fetch for this generation
    Elapsed(u64),
    Cancelled,
    Stop,
}

struct Worker {
    backend: Arc<dyn SearchBackend>,
    debounce: Duration,
    commands: mpsc::UnboundedReceiver<PipelineCommand>,
    shared: Arc<Shared>,
}

impl Worker {
    async fn run(mut self) {
        let mut pending: Option<u64> = None;

        loop {
            let submitted = match pending.take() {
                Some(generation) => generation,
                None => match self.commands.recv().await {
                    Some(PipelineCommand::Submit(generation)) => generation,
                    Some(PipelineCommand::Cancel) => continue,
                    Some(PipelineCommand::Shutdown) | None => break,
                },
            };

            let generation = match self.wait_quiet(submitted).await {
                Quiet::Elapsed(generation) => generation,
                Quiet::Cancelled => {
                    debug!(generation = submitted, "Pending search cancelled");
                    continue;
                }
                Quiet::Stop => break,
            };

            let Some(query) = self.shared.snapshot(generation) else {
                debug!(generation, "Search retired before it started");
                continue;
            };
            info!(generation, query = ?query.query, kind = %query.kind, "Fetching results");

            let backend = Arc::clone(&self.backend);
            let outcome = tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(PipelineCommand::Submit(next)) => Outcome::Superseded(next),
                    Some(PipelineCommand::Cancel) => Outcome::Cancelled,
                    Some(PipelineCommand::Shutdown) | None => Outcome::Stop,
                },
                result = backend.search(&query) => Outcome::Fetched(result),
            };

            match outcome {
                Outcome::Fetched(result) => {
                    self.shared.publish(generation, query, result);
                }
                Outcome::Superseded(next) => {
                    info!(generation, "Search superseded, cancelling in-flight request");
                    pending = Some(next);
                }
                Outcome::Cancelled => {
                    info!(generation, "Search cancelled, dropping in-flight request");
                }
                Outcome::Stop => break,
            }
        }

        debug!("Result pipeline stopped");
    }

    /// Wait until no submit arrived for a full window
    async fn wait_quiet(&mut self, mut generation: u64) -> Quiet {
        if self.debounce.is_zero() {
            return Quiet::Elapsed(generation);
        }

        let window = self.debounce;
        let sleep = tokio::time::sleep(window);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return Quiet::Elapsed(generation),
                command = self.commands.recv() => match command {
                    Some(PipelineCommand::Submit(next)) => {
                        debug!(generation = next, "Coalescing submit into pending search");
                        generation = next;
                        sleep.as_mut().reset(Instant::now() + window);
                    }
                    Some(PipelineCommand::Cancel) => return Quiet::Cancelled,
                    Some(PipelineCommand::Shutdown) | None => return Quiet::Stop,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Paper, PaperJson};

    fn shared() -> Shared {
        Shared {
            store: QueryStore::default(),
            generation: Mutex::new(0),
            state: watch::Sender::new(LoadState::Idle),
            facets: watch::Sender::new(Facets::default()),
        }
    }

    fn results(title: &str) -> SearchResults {
        SearchResults {
            facets: Facets {
                journals: vec![format!("{} journal", title)],
                ..Default::default()
            },
            papers: vec![Paper::from(PaperJson {
                title: Some(title.to_string()),
                ..Default::default()
            })],
        }
    }

    #[test]
    fn test_stale_response_leaves_newer_submit_untouched() {
        let shared = shared();
        let (old, old_query) = shared.begin(QueryPatch::all(SearchQuery::term("old")));

        // A new search starts while the old response is on its way back
        let (new, _) = shared.begin(QueryPatch::all(SearchQuery::term("new")));
        assert!(new > old);

        assert!(!shared.publish(old, old_query, Ok(results("old"))));
        assert_eq!(*shared.state.borrow(), LoadState::Loading);
        assert_eq!(shared.store.current().kind, QueryKind::New);
        assert_eq!(*shared.facets.borrow(), Facets::default());

        let new_query = shared.snapshot(new).unwrap();
        assert_eq!(new_query.query.as_deref(), Some("new"));
        assert!(shared.publish(new, new_query, Ok(results("new"))));
        assert_eq!(shared.store.current().kind, QueryKind::FollowUp);
        assert_eq!(shared.facets.borrow().journals, vec!["new journal".to_string()]);
    }

    #[test]
    fn test_cancel_retires_pending_generation() {
        let shared = shared();
        let (generation, query) = shared.begin(QueryPatch::all(SearchQuery::term("asthma")));
        shared.cancel();

        assert_eq!(shared.snapshot(generation), None);
        assert!(!shared.publish(generation, query, Ok(results("asthma"))));
        assert_eq!(*shared.state.borrow(), LoadState::Idle);
        assert_eq!(shared.store.current(), SearchQuery::default());
        assert!(!shared.store.has_submitted());
    }

    #[test]
    fn test_failure_published_for_latest_generation() {
        let shared = shared();
        let (generation, query) = shared.begin(QueryPatch::all(SearchQuery::term("x")));
        assert!(shared.publish(
            generation,
            query,
            Err(SearchError::Network("refused".to_string()))
        ));
        assert!(matches!(*shared.state.borrow(), LoadState::Failed(_)));
        assert_eq!(shared.store.current().kind, QueryKind::New);
    }
}
