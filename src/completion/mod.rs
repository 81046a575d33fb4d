//! Exactly-once completion of sessions
//!
//! Whatever ends a session (the caller hanging up, an explicit end, a chain
//! fault), the `CompletionCoordinator` freezes its metrics, recovers the
//! transcript, persists outcome and cost once, and moves it to the completed
//! partition.

mod coordinator;
mod extraction;
mod retry;
mod stores;

pub use coordinator::CompletionCoordinator;
pub use extraction::{default_results, CallContext, DefaultExtractor, Extractor, DEFAULT_OUTCOME};
pub use retry::RetryPolicy;
pub use stores::{
    CallRecord, CallResults, CallStore, CallUpdate, MemoryCallStore, MemoryResultsStore,
    ResultsStore,
};

use serde::{Deserialize, Serialize};

use crate::cost::CostBreakdown;
use crate::session::TranscriptEntry;

/// What `end` reports for a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub session_id: String,
    pub transcript: Vec<TranscriptEntry>,
    pub duration_seconds: Option<f64>,
    pub cost_breakdown: Option<CostBreakdown>,
    pub status: String,
}
