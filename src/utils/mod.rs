// Utility functions

pub mod logger;
pub mod retry;

pub use logger::{init_logging, LogTarget};
pub use retry::{with_retry, RetryPolicy};
