//! Search Module
//!
//! Client-side search plumbing for the MediSia literature search service:
//! - `encoder`: query → `GET /search` parameters
//! - `client`: the HTTP call and response decoding
//! - `store`: the current query, shared by every view
//! - `pipeline`: debounced, cancellable fetching of results
//! - `pages`: fixed-size pages for display
//!
//! `SearchSession` bundles the store and pipeline for the UI.

pub mod client;
pub mod encoder;
pub mod pages;
pub mod pipeline;
pub mod session;
pub mod store;

pub use client::{SearchBackend, SearchClient, SearchError};
pub use encoder::{encode, EncodedQuery};
pub use pages::{paginate, Pager, DEFAULT_PAGE_SIZE};
pub use pipeline::{LoadState, PipelineCommand, ResultPipeline, ResultSet};
pub use session::SearchSession;
pub use store::QueryStore;
