//! Pipeline module for staged, resumable scraping
//!
//! This module contains the orchestration logic:
//! - Stage definitions and ordering
//! - Deterministic image identifier assignment
//! - Per-stage skip reports and the run summary
//! - The `Pipeline` coordinator that ties the crawler and storage together

mod coordinator;
mod identifiers;
mod progress;
mod report;
mod stage;

pub use coordinator::Pipeline;
pub use identifiers::{assign_identifiers, format_identifier, identifier_width, ImageSlot};
pub use report::{RunSummary, Skip, SkipReason, StageReport};
pub use stage::Stage;
