use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::completion::{
    CallStore, CompletionCoordinator, CompletionSummary, Extractor, ResultsStore, RetryPolicy,
};
use crate::cost::CostEstimator;
use crate::error::{SessionError, SessionResult};
use crate::pipeline::{ChainExit, PipelineAssembler, PipelineExecutor, StageRegistry};
use crate::prompt::{fill_placeholders, CallRequest};
use crate::session::{PipelineConfig, Session, SessionRegistry};
use crate::transport::{ConnectionInfo, TransportRegistry};

/// Everything the orchestrator is built from
pub struct OrchestratorParts {
    pub registry: Arc<SessionRegistry>,
    pub transports: TransportRegistry,
    pub stages: StageRegistry,
    pub calls: Arc<dyn CallStore>,
    pub results: Arc<dyn ResultsStore>,
    pub extractor: Arc<dyn Extractor>,
    pub costs: CostEstimator,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartedSession {
    pub session_id: String,
    pub connection: ConnectionInfo,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Completed,
}

/// Point-in-time view of a session for status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub call_id: String,
    pub state: SessionState,
    pub pipeline_config: PipelineConfig,
    pub connection: ConnectionInfo,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: Option<f64>,
    pub transcript_messages: usize,
    pub metrics_saved: bool,
}

/// Public entry point for starting and ending sessions
pub struct SessionOrchestrator {
    registry: Arc<SessionRegistry>,
    transports: TransportRegistry,
    assembler: PipelineAssembler,
    executor: PipelineExecutor,
    completion: Arc<CompletionCoordinator>,
    calls: Arc<dyn CallStore>,
}

/// Abandons a session's launch if `start` returns or is dropped before the
/// chain is running, so a waiting `end` is released
struct PendingLaunch(Arc<Session>);

impl Drop for PendingLaunch {
    fn drop(&mut self) {
        self.0.abandon_launch();
    }
}

impl SessionOrchestrator {
    pub fn new(parts: OrchestratorParts) -> Self {
        let completion = CompletionCoordinator::new(
            parts.registry.clone(),
            parts.calls.clone(),
            parts.results,
            parts.extractor,
            parts.costs,
            parts.retry,
        );

        Self {
            registry: parts.registry,
            transports: parts.transports,
            assembler: PipelineAssembler::new(parts.stages),
            executor: PipelineExecutor::new(),
            completion: Arc::new(completion),
            calls: parts.calls,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Provision a transport, register the session, and launch its chain.
    ///
    /// Nothing is registered unless provisioning succeeds, and a chain that
    /// fails to assemble rolls the registration back.
    pub async fn start(
        &self,
        request: CallRequest,
        config: PipelineConfig,
        system_prompt: &str,
    ) -> SessionResult<StartedSession> {
        self.assembler.validate(&config)?;

        let transport = self
            .transports
            .get(config.transport)
            .ok_or_else(|| SessionError::UnsupportedTransport(config.transport.to_string()))?;

        let session_id = Uuid::new_v4().to_string();
        let prompt = fill_placeholders(system_prompt, &request);

        info!(
            "Starting session {} for call {} over {}",
            session_id, request.call_id, config.transport
        );

        let connection = transport.start(&session_id).await.map_err(|e| {
            error!("Failed to provision transport for session {}: {}", session_id, e);
            SessionError::Provisioning(e)
        })?;

        let link = match transport.connect(&session_id, &connection).await {
            Ok(link) => link,
            Err(e) => {
                error!("Failed to connect transport for session {}: {}", session_id, e);
                transport.release(&session_id).await;
                return Err(SessionError::Provisioning(e));
            }
        };

        let session = match self
            .registry
            .create(&session_id, &request.call_id, config, &prompt, connection.clone())
            .await
        {
            Ok(session) => session,
            Err(e) => {
                transport.release(&session_id).await;
                return Err(e);
            }
        };
        let pending = PendingLaunch(Arc::clone(&session));

        let chain = match self.assembler.build(&session, link).await {
            Ok(chain) => chain,
            Err(e) => {
                error!("Failed to assemble pipeline for session {}: {}", session_id, e);
                self.registry.discard(&session_id).await;
                transport.release(&session_id).await;
                return Err(e);
            }
        };

        if let Err(e) = self.calls.open(&request).await {
            warn!("Could not record call {}: {:#}", request.call_id, e);
        }

        let handle = self.executor.launch(chain, &session).await;
        drop(pending);

        let completion = Arc::clone(&self.completion);
        tokio::spawn(async move {
            let exit = handle.wait().await;
            if let ChainExit::Faulted(reason) = &exit {
                debug!("Finalizing faulted session {}: {}", session.id(), reason);
            }
            completion.finalize(&session).await;
            transport.release(session.id()).await;
        });

        info!("Session {} initialized", session_id);

        Ok(StartedSession {
            session_id,
            connection,
            status: "initialized".to_string(),
        })
    }

    /// End a session and return its completion summary.
    ///
    /// Unknown ids yield `None`; completed sessions replay their summary.
    pub async fn end(&self, session_id: &str) -> Option<CompletionSummary> {
        let session = self.registry.get(session_id).await?;

        if !self.registry.is_completed(session_id).await {
            info!("Ending session {}", session_id);
            match self.executor.cancel(&session).await {
                Some(exit) => debug!("Session {} chain exited: {:?}", session_id, exit),
                // A start that failed after registering rolls the session back
                None if self.registry.get(session_id).await.is_none() => return None,
                None => {}
            }
        }

        Some(self.completion.finalize(&session).await)
    }

    pub async fn active_session_ids(&self) -> Vec<String> {
        self.registry.active_ids().await
    }

    pub async fn active_session_count(&self) -> usize {
        self.registry.active_count().await
    }

    pub async fn status(&self, session_id: &str) -> Option<SessionStatus> {
        let session = self.registry.get(session_id).await?;
        let state = if self.registry.is_completed(session_id).await {
            SessionState::Completed
        } else {
            SessionState::Active
        };

        let record = session.snapshot().await;
        Some(SessionStatus {
            session_id: record.session_id,
            call_id: record.call_id,
            state,
            pipeline_config: record.pipeline_config,
            connection: record.transport,
            start_time: record.metrics.start_time,
            duration_seconds: record.metrics.duration_seconds,
            transcript_messages: record.transcript.len(),
            metrics_saved: record.metrics_saved,
        })
    }
}
