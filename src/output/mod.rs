//! Output module for reporting run results
//!
//! This module handles:
//! - Rendering the end-of-run summary
//! - Grouping skip diagnostics by kind

mod summary;

pub use summary::{group_skips, print_summary, render_summary};
