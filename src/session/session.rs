use super::config::PipelineConfig;
use super::stats::{Role, SessionMetrics, TranscriptEntry};
use crate::completion::CompletionSummary;
use crate::pipeline::{ChainControl, ConversationContext, Usage};
use crate::transport::ConnectionInfo;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::debug;

/// Persisted projection of a session: everything except live handles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique session identifier (uuid v4)
    pub session_id: String,

    /// External call record this session reports into
    pub call_id: String,

    /// Provider and transport choices
    pub pipeline_config: PipelineConfig,

    /// System prompt with placeholders already filled
    pub system_prompt: String,

    /// Connection details handed back to the caller
    pub transport: ConnectionInfo,

    /// Captured conversation, in arrival order
    pub transcript: Vec<TranscriptEntry>,

    /// Timing and usage
    pub metrics: SessionMetrics,

    /// Whether the completion workflow has persisted this session
    pub metrics_saved: bool,

    /// Result of the completion workflow, replayed by repeated end requests
    pub summary: Option<CompletionSummary>,
}

impl SessionRecord {
    /// Append a turn. Entries are never reordered or removed.
    pub fn append_transcript(&mut self, role: Role, content: &str) {
        self.transcript.push(TranscriptEntry::new(role, content));
        debug!(
            "[SESSION {}] Added {} message to transcript",
            self.session_id, role
        );
    }
}

/// Runtime-only companion of a session record
#[derive(Default)]
pub struct SessionRuntime {
    /// Control over the running chain; present only while active
    pub chain: Option<ChainControl>,

    /// The dialogue model's running context
    pub context: Option<ConversationContext>,
}

/// Where a session is in getting its chain running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    /// Registered, chain not yet launched
    Starting,
    /// Chain control is on the runtime
    Launched,
    /// Start gave up before launching
    Abandoned,
}

/// A voice-call session tracked by the registry
pub struct Session {
    id: String,
    record: Mutex<SessionRecord>,
    runtime: Mutex<SessionRuntime>,
    finalize_lock: Mutex<()>,
    launch: watch::Sender<LaunchState>,
}

impl Session {
    pub fn new(
        session_id: impl Into<String>,
        call_id: impl Into<String>,
        pipeline_config: PipelineConfig,
        system_prompt: impl Into<String>,
        transport: ConnectionInfo,
    ) -> Self {
        let id = session_id.into();
        let record = SessionRecord {
            session_id: id.clone(),
            call_id: call_id.into(),
            pipeline_config,
            system_prompt: system_prompt.into(),
            transport,
            transcript: Vec::new(),
            metrics: SessionMetrics::started_now(),
            metrics_saved: false,
            summary: None,
        };

        Self {
            id,
            record: Mutex::new(record),
            runtime: Mutex::new(SessionRuntime::default()),
            finalize_lock: Mutex::new(()),
            launch: watch::channel(LaunchState::Starting).0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Copy of the persisted projection
    pub async fn snapshot(&self) -> SessionRecord {
        self.record.lock().await.clone()
    }

    pub async fn record(&self) -> MutexGuard<'_, SessionRecord> {
        self.record.lock().await
    }

    pub async fn runtime(&self) -> MutexGuard<'_, SessionRuntime> {
        self.runtime.lock().await
    }

    /// Held for the whole completion workflow so finalize runs one at a time
    pub(crate) async fn finalize_guard(&self) -> MutexGuard<'_, ()> {
        self.finalize_lock.lock().await
    }

    pub fn launch_state(&self) -> LaunchState {
        *self.launch.borrow()
    }

    pub(crate) fn mark_launched(&self) {
        self.launch.send_replace(LaunchState::Launched);
    }

    /// Only a session still starting can be abandoned
    pub(crate) fn abandon_launch(&self) {
        self.launch.send_if_modified(|state| {
            if *state == LaunchState::Starting {
                *state = LaunchState::Abandoned;
                true
            } else {
                false
            }
        });
    }

    /// Resolves once start has either launched the chain or given up
    pub async fn launch_settled(&self) -> LaunchState {
        let mut launch = self.launch.subscribe();
        loop {
            let state = *launch.borrow_and_update();
            if state != LaunchState::Starting {
                return state;
            }
            if launch.changed().await.is_err() {
                return LaunchState::Abandoned;
            }
        }
    }

    pub async fn append_transcript(&self, role: Role, content: &str) {
        self.record.lock().await.append_transcript(role, content);
    }

    pub async fn add_usage(&self, usage: Usage) {
        self.record
            .lock()
            .await
            .metrics
            .add_usage(usage.input_tokens, usage.output_tokens, usage.chars);
    }

    pub async fn context(&self) -> Option<ConversationContext> {
        self.runtime.lock().await.context.clone()
    }
}
