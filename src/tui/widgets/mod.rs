//! TUI Widgets
//!
//! Custom widgets for the MediSia TUI.

mod filter;
mod results;
mod status;

pub use filter::render_filter;
pub use results::render_results;
pub use status::{render_status, truncate_string};
