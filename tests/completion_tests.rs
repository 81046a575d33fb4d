mod common;

use anyhow::Result;
use chrono::Duration as ChronoDuration;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use voice_sessions::completion::{
    CallStore, CompletionCoordinator, DefaultExtractor, Extractor, RetryPolicy, DEFAULT_OUTCOME,
};
use voice_sessions::cost::CostEstimator;
use voice_sessions::pipeline::ConversationContext;
use voice_sessions::session::{Role, Session, SessionRegistry, TransportKind};
use voice_sessions::transport::ConnectionInfo;

struct Fixture {
    registry: Arc<SessionRegistry>,
    calls: Arc<common::CountingCallStore>,
    results: Arc<common::CountingResultsStore>,
    coordinator: Arc<CompletionCoordinator>,
}

async fn fixture(extractor: Arc<dyn Extractor>) -> Fixture {
    let h = common::harness(&[]).await;
    let coordinator = CompletionCoordinator::new(
        h.registry.clone(),
        h.calls.clone(),
        h.results.clone(),
        extractor,
        CostEstimator::default(),
        RetryPolicy::none(),
    );
    Fixture {
        registry: h.registry,
        calls: h.calls,
        results: h.results,
        coordinator: Arc::new(coordinator),
    }
}

async fn socket_session(registry: &SessionRegistry, id: &str) -> Result<Arc<Session>> {
    Ok(registry
        .create(
            id,
            common::CALL_ID,
            common::pipeline_config(TransportKind::Socket),
            "prompt",
            ConnectionInfo::Socket {
                url: format!("ws://localhost/sessions/{}/ws", id),
            },
        )
        .await?)
}

/// Give the session a positive duration so extraction runs
async fn backdate(session: &Session, seconds: i64) {
    let mut record = session.record().await;
    record.metrics.start_time = record.metrics.start_time - ChronoDuration::seconds(seconds);
}

#[tokio::test]
async fn test_zero_duration_socket_session_records_default() -> Result<()> {
    let f = fixture(Arc::new(DefaultExtractor::new())).await;
    let session = socket_session(&f.registry, "zero").await?;
    {
        let mut record = session.record().await;
        record.metrics.end_time = Some(record.metrics.start_time);
    }

    let summary = f.coordinator.finalize(&session).await;

    assert_eq!(summary.duration_seconds, Some(0.0));
    let cost = summary.cost_breakdown.expect("cost computed");
    assert_eq!(cost.total_cost_usd, 0.0);

    let results = f.results.inner.get(common::CALL_ID).await.expect("results stored");
    assert_eq!(results.call_outcome, DEFAULT_OUTCOME);
    assert!(!results.is_emergency);
    assert!(results.raw_extraction.contains_key("cost_breakdown"));

    let call = f.calls.get(common::CALL_ID).await?.expect("call");
    assert_eq!(call.status, "completed");
    assert_eq!(call.duration_seconds, None);
    assert!(f.registry.is_completed("zero").await);
    Ok(())
}

#[tokio::test]
async fn test_finalize_is_idempotent() -> Result<()> {
    let f = fixture(Arc::new(DefaultExtractor::new())).await;
    let session = socket_session(&f.registry, "twice").await?;
    session.append_transcript(Role::User, "on the road, about two hours out").await;
    backdate(&session, 90).await;

    let (a, b) = tokio::join!(f.coordinator.finalize(&session), f.coordinator.finalize(&session));
    let c = f.coordinator.finalize(&session).await;

    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(f.results.upserts.load(Ordering::SeqCst), 1);
    assert_eq!(f.calls.updates.load(Ordering::SeqCst), 1);
    assert!(session.snapshot().await.metrics_saved);
    Ok(())
}

#[tokio::test]
async fn test_extraction_runs_for_real_calls() -> Result<()> {
    let f = fixture(Arc::new(DefaultExtractor::new())).await;
    let session = socket_session(&f.registry, "routine").await?;
    session.append_transcript(Role::Assistant, "Hi Mike, where are you?").await;
    session.append_transcript(Role::User, "Arrived at the dock just now").await;
    backdate(&session, 45).await;

    let summary = f.coordinator.finalize(&session).await;

    let results = f.results.inner.get(common::CALL_ID).await.expect("results");
    assert_eq!(results.call_outcome, "Arrival Confirmation");
    assert_eq!(results.call_id, common::CALL_ID);

    let call = f.calls.get(common::CALL_ID).await?.expect("call");
    assert_eq!(call.duration_seconds, Some(45));
    assert_eq!(
        call.transcript.as_deref(),
        Some("ASSISTANT: Hi Mike, where are you?\n\nUSER: Arrived at the dock just now")
    );
    assert_eq!(summary.transcript.len(), 2);
    assert_eq!(summary.status, "completed");
    Ok(())
}

#[tokio::test]
async fn test_extraction_failure_falls_back_to_default() -> Result<()> {
    let f = fixture(Arc::new(common::FailingExtractor)).await;
    let session = socket_session(&f.registry, "no-extract").await?;
    session.append_transcript(Role::User, "my engine is smoking").await;
    backdate(&session, 30).await;

    let summary = f.coordinator.finalize(&session).await;

    let results = f.results.inner.get(common::CALL_ID).await.expect("results");
    assert_eq!(results.call_outcome, DEFAULT_OUTCOME);
    assert!(!results.is_emergency);
    assert!(summary.cost_breakdown.is_some());
    assert!(f.registry.is_completed("no-extract").await);
    Ok(())
}

#[tokio::test]
async fn test_transcript_recovered_from_context() -> Result<()> {
    let f = fixture(Arc::new(DefaultExtractor::new())).await;
    let session = socket_session(&f.registry, "recover").await?;

    let context = ConversationContext::seeded("prompt");
    context.push(Role::User, "hello?").await;
    context.push(Role::Assistant, "Hi, this is dispatch").await;
    session.runtime().await.context = Some(context);

    let summary = f.coordinator.finalize(&session).await;

    let roles: Vec<Role> = summary.transcript.iter().map(|e| e.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(session.snapshot().await.transcript.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_call_record_still_completes() -> Result<()> {
    let f = fixture(Arc::new(DefaultExtractor::new())).await;
    let session = f
        .registry
        .create(
            "orphan",
            "call-unknown",
            common::pipeline_config(TransportKind::Socket),
            "prompt",
            ConnectionInfo::Socket {
                url: "ws://localhost/sessions/orphan/ws".to_string(),
            },
        )
        .await?;
    session.append_transcript(Role::User, "driving").await;
    backdate(&session, 10).await;

    let summary = f.coordinator.finalize(&session).await;

    assert_eq!(summary.status, "completed");
    assert!(f.registry.is_completed("orphan").await);
    assert!(session.snapshot().await.metrics_saved);
    Ok(())
}
