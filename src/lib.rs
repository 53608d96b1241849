// MediSia - terminal client for the MediSia medical literature search service

pub mod config;
pub mod form;
pub mod models;
pub mod search;    // Query encoding, HTTP client, query store and result pipeline
pub mod tui;       // Terminal User Interface
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use search::{SearchClient, SearchSession};
