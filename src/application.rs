//! Application layer
//!
//! Drives the per-source crawlers for a whole run.

pub mod orchestrator;

pub use orchestrator::{CrawlOrchestrator, OrchestratorReport, OrchestratorSettings};
