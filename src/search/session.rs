//! Search Session
//!
//! One store plus one pipeline, handed explicitly to whoever needs them.
//! Local edits go through [`SearchSession::edit`]; only
//! [`SearchSession::submit`] triggers a fetch.

use crate::config::Config;
use crate::models::{Facets, QueryPatch, SearchQuery};
use crate::search::client::{SearchBackend, SearchClient, SearchError};
use crate::search::pipeline::{LoadState, ResultPipeline};
use crate::search::store::QueryStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

pub struct SearchSession {
    store: QueryStore,
    pipeline: ResultPipeline,
}

impl SearchSession {
    /// Start a session backed by `backend`. Must run inside a tokio runtime.
    pub fn new(backend: Arc<dyn SearchBackend>, debounce: Duration) -> Self {
        let store = QueryStore::default();
        let pipeline = ResultPipeline::spawn(store.clone(), backend, debounce);
        Self { store, pipeline }
    }

    /// Session talking HTTP to the configured search service
    pub fn from_config(config: &Config) -> Result<Self, SearchError> {
        let client = SearchClient::from_config(&config.api)?;
        info!(endpoint = %client.endpoint(), "Search client ready");
        Ok(Self::new(Arc::new(client), config.pipeline.debounce))
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    pub fn query(&self) -> SearchQuery {
        self.store.current()
    }

    /// Change the query without fetching
    pub fn edit(&self, patch: QueryPatch) -> SearchQuery {
        self.store.update(patch)
    }

    /// Change the query and fetch results for it
    pub fn submit(&self, patch: QueryPatch) -> SearchQuery {
        let query = self.pipeline.submit(patch);
        info!(query = ?query.query, kind = %query.kind, "Submitted search");
        query
    }

    /// Replace the whole query and fetch results for it
    pub fn submit_query(&self, query: SearchQuery) -> SearchQuery {
        self.submit(QueryPatch::all(query))
    }

    /// Forget the current search and any results still on their way
    pub fn reset(&self) {
        self.pipeline.reset();
    }

    pub fn has_submitted(&self) -> bool {
        self.store.has_submitted()
    }

    pub fn state(&self) -> LoadState {
        self.pipeline.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<LoadState> {
        self.pipeline.watch_state()
    }

    pub fn facets(&self) -> Facets {
        self.pipeline.facets()
    }

    /// Wait until the pending search (if any) has been published
    pub async fn wait_settled(&self) -> LoadState {
        let mut rx = self.pipeline.watch_state();
        let settled = match rx.wait_for(LoadState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.pipeline.state(),
        };
        settled
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.pipeline.shutdown();
    }
}
