use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::extraction::{default_results, CallContext, Extractor};
use super::retry::RetryPolicy;
use super::stores::{CallResults, CallStore, CallUpdate, ResultsStore};
use super::CompletionSummary;
use crate::cost::{CostBreakdown, CostEstimator, CostRequest};
use crate::error::SessionError;
use crate::session::{Session, SessionRecord, SessionRegistry};
use crate::transcript;

/// Runs the completion workflow for sessions, once each
pub struct CompletionCoordinator {
    registry: Arc<SessionRegistry>,
    calls: Arc<dyn CallStore>,
    results: Arc<dyn ResultsStore>,
    extractor: Arc<dyn Extractor>,
    costs: CostEstimator,
    retry: RetryPolicy,
}

impl CompletionCoordinator {
    pub fn new(
        registry: Arc<SessionRegistry>,
        calls: Arc<dyn CallStore>,
        results: Arc<dyn ResultsStore>,
        extractor: Arc<dyn Extractor>,
        costs: CostEstimator,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            calls,
            results,
            extractor,
            costs,
            retry,
        }
    }

    /// Finalize a session. Safe to call from every exit path: only the first
    /// call persists anything, later ones replay the cached summary.
    ///
    /// Must only run after the session's chain has exited.
    pub async fn finalize(&self, session: &Arc<Session>) -> CompletionSummary {
        let _guard = session.finalize_guard().await;
        let session_id = session.id().to_string();

        let context = match session.context().await {
            Some(context) => context.messages().await,
            None => Vec::new(),
        };

        let pending = {
            let mut record = session.record().await;

            if record.metrics.freeze() {
                debug!(
                    "Froze metrics for session {}: {:.1}s",
                    session_id,
                    record.metrics.duration_seconds.unwrap_or(0.0)
                );
            }

            if record.transcript.is_empty() {
                let recovered = transcript::recover(&record.transcript, &context);
                if !recovered.is_empty() {
                    info!(
                        "[TRANSCRIPT] Recovered {} messages from context for session {}",
                        recovered.len(),
                        session_id
                    );
                    record.transcript = recovered;
                }
            }

            if record.metrics_saved {
                None
            } else {
                Some(record.clone())
            }
        };

        let summary = match pending {
            Some(record) => {
                let cost_breakdown = self.persist(&record).await;
                let summary = CompletionSummary {
                    session_id: session_id.clone(),
                    transcript: record.transcript.clone(),
                    duration_seconds: record.metrics.duration_seconds,
                    cost_breakdown,
                    status: "completed".to_string(),
                };

                let mut record = session.record().await;
                record.metrics_saved = true;
                record.summary = Some(summary.clone());
                summary
            }
            None => {
                let record = session.record().await;
                record.summary.clone().unwrap_or_else(|| summary_of(&record))
            }
        };

        match self.registry.mark_completed(&session_id).await {
            Ok(()) => info!("Session {} completed", session_id),
            Err(SessionError::NotActive(_)) => {
                debug!("Session {} was already completed", session_id)
            }
            Err(e) => warn!("Could not mark session {} completed: {}", session_id, e),
        }

        summary
    }

    /// Extract, price, and write a session's outcome. Failures are logged and
    /// never abort completion.
    async fn persist(&self, record: &SessionRecord) -> Option<CostBreakdown> {
        let call_id = record.call_id.as_str();
        let duration = record.metrics.duration_seconds.unwrap_or(0.0);
        let transcript_text = if record.transcript.is_empty() {
            None
        } else {
            Some(transcript::format_transcript(&record.transcript))
        };

        info!(
            "[CALL_COMPLETION] Starting completion for session {} (call {})",
            record.session_id, call_id
        );

        let mut results = match &transcript_text {
            Some(text) if duration > 0.0 => self.extract(call_id, text).await,
            _ => {
                info!("[CALL_COMPLETION] Nothing to extract from, recording default outcome");
                default_results(call_id)
            }
        };

        let cost_breakdown = match self.costs.calculate(&CostRequest::for_session(record)) {
            Ok(breakdown) => Some(breakdown),
            Err(e) => {
                error!("[COST] Failed to calculate cost for session {}: {}", record.session_id, e);
                None
            }
        };

        let cost_value = cost_breakdown
            .as_ref()
            .and_then(|b| serde_json::to_value(b).ok())
            .unwrap_or(Value::Null);
        results.raw_extraction.insert("cost_breakdown".to_string(), cost_value);

        if !record.transcript.is_empty() {
            let counts = transcript::message_counts(&record.transcript);
            info!(
                "[CALL_COMPLETION] Transcript: {} messages ({} user, {} assistant)",
                counts.total, counts.user, counts.assistant
            );
        }

        let update = CallUpdate {
            status: "completed".to_string(),
            transcript: transcript_text,
            duration_seconds: Some(duration as u64).filter(|_| duration > 0.0),
            ended_at: record.metrics.end_time.unwrap_or_else(Utc::now),
        };

        let calls = &self.calls;
        match self
            .retry
            .run("call update", move || calls.update(call_id, update.clone()))
            .await
        {
            Ok(()) => info!("[CALL_COMPLETION] Updated call status: {}", call_id),
            Err(e) => error!("[CALL_COMPLETION] Failed to update call {}: {:#}", call_id, e),
        }

        let store = &self.results;
        match self
            .retry
            .run("results upsert", move || store.upsert(results.clone()))
            .await
        {
            Ok(()) => info!("[CALL_COMPLETION] Stored results for call: {}", call_id),
            Err(e) => error!("[CALL_COMPLETION] Failed to store results for {}: {:#}", call_id, e),
        }

        cost_breakdown
    }

    async fn extract(&self, call_id: &str, transcript_text: &str) -> CallResults {
        let call = match self.calls.get(call_id).await {
            Ok(Some(call)) => call,
            Ok(None) => {
                warn!("[CALL_COMPLETION] Call {} not found, using default outcome", call_id);
                return default_results(call_id);
            }
            Err(e) => {
                warn!("[CALL_COMPLETION] Could not fetch call {}: {:#}", call_id, e);
                return default_results(call_id);
            }
        };

        let context = CallContext::from(&call);
        match self.extractor.extract(call_id, transcript_text, &context).await {
            Ok(mut results) => {
                results.call_id = call_id.to_string();
                info!(
                    "[CALL_COMPLETION] Extracted outcome '{}' for call {}",
                    results.call_outcome, call_id
                );
                results
            }
            Err(e) => {
                warn!("[CALL_COMPLETION] Failed to extract data for {}: {:#}", call_id, e);
                default_results(call_id)
            }
        }
    }
}

fn summary_of(record: &SessionRecord) -> CompletionSummary {
    CompletionSummary {
        session_id: record.session_id.clone(),
        transcript: record.transcript.clone(),
        duration_seconds: record.metrics.duration_seconds,
        cost_breakdown: None,
        status: "completed".to_string(),
    }
}
