//! Query State Store
//!
//! Holds the current [`SearchQuery`]. Writers replace or patch it; readers
//! either take a snapshot with [`QueryStore::current`] or follow every change
//! through [`QueryStore::subscribe`], which starts with the value current at
//! subscription time.

use crate::models::{QueryPatch, SearchQuery};
use futures::stream::{self, Stream, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 64;

struct StoreState {
    query: SearchQuery,
    submitted: bool,
}

struct Shared {
    state: Mutex<StoreState>,
    changes: broadcast::Sender<SearchQuery>,
}

/// Shared handle to the current search query
#[derive(Clone)]
pub struct QueryStore {
    shared: Arc<Shared>,
}

impl Default for QueryStore {
    fn default() -> Self {
        Self::new(SearchQuery::default())
    }
}

impl QueryStore {
    pub fn new(initial: SearchQuery) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(StoreState {
                    query: initial,
                    submitted: false,
                }),
                changes,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // Mutations are single assignments, so a poisoned lock still holds a whole query
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Latest query
    pub fn current(&self) -> SearchQuery {
        self.lock().query.clone()
    }

    /// Overwrite the current query
    pub fn replace(&self, query: SearchQuery) {
        let mut state = self.lock();
        state.query = query;
        self.notify(&state.query);
    }

    /// Merge `patch` into the current query as one atomic step
    pub fn update(&self, patch: QueryPatch) -> SearchQuery {
        let mut state = self.lock();
        state.query.apply(patch);
        self.notify(&state.query);
        state.query.clone()
    }

    /// Back to the default query, forgetting any submitted search
    pub fn reset(&self) {
        let mut state = self.lock();
        state.query = SearchQuery::default();
        state.submitted = false;
        self.notify(&state.query);
    }

    /// Record that the current query has been sent to the backend
    pub(crate) fn mark_submitted(&self) {
        self.lock().submitted = true;
    }

    /// Whether a search has been submitted since construction or the last reset
    pub fn has_submitted(&self) -> bool {
        self.lock().submitted
    }

    /// Stream of query states: the current one first, then every change.
    /// A subscriber that falls too far behind skips ahead to newer states.
    pub fn subscribe(&self) -> impl Stream<Item = SearchQuery> + Send + 'static {
        // Snapshot and subscribe under the lock so no change falls between them
        let (first, rx) = {
            let state = self.lock();
            (state.query.clone(), self.shared.changes.subscribe())
        };

        let rest = stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(query) => return Some((query, rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Query subscriber lagged behind");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });

        stream::once(async move { first }).chain(rest)
    }

    fn notify(&self, query: &SearchQuery) {
        debug!(kind = %query.kind, "Query state changed");
        // No receivers is fine
        let _ = self.shared.changes.send(query.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QueryKind, YearFilter};
    use futures::FutureExt;

    #[test]
    fn test_update_merges_into_current() {
        let store = QueryStore::default();
        store.update(QueryPatch {
            query: Some(Some("malaria".to_string())),
            ..Default::default()
        });
        store.update(QueryPatch::pubyears(Some(YearFilter::from_year(2015))));

        let current = store.current();
        assert_eq!(current.query.as_deref(), Some("malaria"));
        assert_eq!(current.pubyears, Some(YearFilter::from_year(2015)));
        assert_eq!(current.kind, QueryKind::FollowUp);
    }

    #[tokio::test]
    async fn test_subscribe_after_updates_sees_latest() {
        let store = QueryStore::default();
        store.update(QueryPatch {
            query: Some(Some("one".to_string())),
            ..Default::default()
        });
        store.update(QueryPatch::journals(vec!["BMJ".to_string()]));
        store.update(QueryPatch {
            deep: Some(true),
            ..Default::default()
        });

        let mut states = Box::pin(store.subscribe());
        let first = states.next().await.unwrap();
        assert_eq!(first.query.as_deref(), Some("one"));
        assert_eq!(first.journals, vec!["BMJ".to_string()]);
        assert!(first.deep);

        // Nothing newer yet
        assert!(states.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_subscriber_sees_every_later_change() {
        let store = QueryStore::default();
        let mut states = Box::pin(store.subscribe());
        assert_eq!(states.next().await.unwrap(), SearchQuery::default());

        store.replace(SearchQuery::term("a"));
        store.replace(SearchQuery::term("b"));
        store.reset();

        assert_eq!(states.next().await.unwrap().query.as_deref(), Some("a"));
        assert_eq!(states.next().await.unwrap().query.as_deref(), Some("b"));
        assert_eq!(states.next().await.unwrap(), SearchQuery::default());
    }

    #[tokio::test]
    async fn test_subscription_is_restartable() {
        let store = QueryStore::default();
        store.replace(SearchQuery::term("first"));
        drop(store.subscribe());

        store.replace(SearchQuery::term("second"));
        let mut states = Box::pin(store.subscribe());
        assert_eq!(states.next().await.unwrap().query.as_deref(), Some("second"));
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = QueryStore::default();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if i % 2 == 0 {
                            store.update(QueryPatch::journals(vec![format!("j{}", i)]));
                        } else {
                            store.update(QueryPatch::categories(vec![format!("c{}", i)]));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let current = store.current();
        assert_eq!(current.journals.len(), 1);
        assert_eq!(current.categories.len(), 1);
    }

    #[test]
    fn test_reset_clears_submission() {
        let store = QueryStore::default();
        store.replace(SearchQuery::term("x"));
        store.mark_submitted();
        assert!(store.has_submitted());
        store.reset();
        assert!(!store.has_submitted());
        assert_eq!(store.current(), SearchQuery::default());
    }
}
