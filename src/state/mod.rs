//! State module for tracking run progress
//!
//! # Components
//!
//! - `RunState`: the state machine a scrape run walks through, page by page

mod run_state;

// Re-export main types
pub use run_state::RunState;
