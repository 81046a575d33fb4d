#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use voice_sessions::completion::{
    CallContext, CallRecord, CallResults, CallStore, CallUpdate, DefaultExtractor, Extractor,
    MemoryCallStore, MemoryResultsStore, ResultsStore, RetryPolicy,
};
use voice_sessions::cost::CostEstimator;
use voice_sessions::orchestrator::{OrchestratorParts, SessionOrchestrator};
use voice_sessions::prompt::CallRequest;
use voice_sessions::pipeline::{AudioChunk, Frame, FrameProcessor, StageRegistry, Usage};
use voice_sessions::session::{PipelineConfig, ProviderSelection, SessionRegistry, TransportKind};
use voice_sessions::transport::{
    ManagedSocketTransport, MediaLink, RoomGrant, RoomMedia, RoomProvider, RoomTransport,
    SocketHub, TransportError, TransportRegistry,
};

pub const CALL_ID: &str = "call-1";

// ============================================================================
// Provider stages
// ============================================================================

/// Turns each audio frame into the next scripted final transcription
pub struct ScriptedRecognizer {
    script: VecDeque<String>,
}

#[async_trait]
impl FrameProcessor for ScriptedRecognizer {
    fn name(&self) -> &str {
        "speech-recognition"
    }

    async fn process(&mut self, frame: Frame) -> Result<Vec<Frame>> {
        match frame {
            Frame::Audio(_) => Ok(self
                .script
                .pop_front()
                .map(|text| Frame::Transcription {
                    text,
                    is_final: true,
                })
                .into_iter()
                .collect()),
            other => Ok(vec![other]),
        }
    }
}

/// Recognizer that fails on the first audio frame
pub struct BrokenRecognizer;

#[async_trait]
impl FrameProcessor for BrokenRecognizer {
    fn name(&self) -> &str {
        "speech-recognition"
    }

    async fn process(&mut self, frame: Frame) -> Result<Vec<Frame>> {
        match frame {
            Frame::Audio(_) => bail!("recognizer connection dropped"),
            other => Ok(vec![other]),
        }
    }
}

/// Replies to every final transcription with `echo: <text>`, in two chunks
pub struct EchoDialogue;

#[async_trait]
impl FrameProcessor for EchoDialogue {
    fn name(&self) -> &str {
        "dialogue-model"
    }

    async fn process(&mut self, frame: Frame) -> Result<Vec<Frame>> {
        match &frame {
            Frame::Transcription {
                text,
                is_final: true,
            } => {
                let reply = text.clone();
                Ok(vec![
                    frame,
                    Frame::Text("echo: ".to_string()),
                    Frame::Text(reply),
                    Frame::ResponseEnd,
                    Frame::Usage(Usage {
                        input_tokens: 10,
                        output_tokens: 5,
                        chars: 0,
                    }),
                ])
            }
            _ => Ok(vec![frame]),
        }
    }
}

/// Emits one speech chunk per reply and reports the characters spoken
pub struct CountingSynth {
    pending: String,
}

#[async_trait]
impl FrameProcessor for CountingSynth {
    fn name(&self) -> &str {
        "text-to-speech"
    }

    async fn process(&mut self, frame: Frame) -> Result<Vec<Frame>> {
        match &frame {
            Frame::Text(chunk) => {
                self.pending.push_str(chunk);
                Ok(vec![frame])
            }
            Frame::ResponseEnd => {
                let spoken = std::mem::take(&mut self.pending);
                Ok(vec![
                    Frame::Speech(AudioChunk::mono_16k(vec![0; 160])),
                    frame,
                    Frame::Usage(Usage {
                        input_tokens: 0,
                        output_tokens: 0,
                        chars: spoken.chars().count() as u64,
                    }),
                ])
            }
            _ => Ok(vec![frame]),
        }
    }
}

pub fn stages(script: &[&str]) -> StageRegistry {
    let script: Vec<String> = script.iter().map(|s| s.to_string()).collect();
    let mut stages = StageRegistry::new();
    stages
        .register_recognition("scripted", move |_| {
            Ok(Box::new(ScriptedRecognizer {
                script: script.clone().into(),
            }))
        })
        .register_recognition("broken", |_| Ok(Box::new(BrokenRecognizer)))
        .register_dialogue("echo", |_, _| Ok(Box::new(EchoDialogue)))
        .register_synthesis("counting", |_| {
            Ok(Box::new(CountingSynth {
                pending: String::new(),
            }))
        });
    stages
}

pub fn pipeline_config(transport: TransportKind) -> PipelineConfig {
    PipelineConfig {
        recognition: ProviderSelection::new("scripted", None),
        dialogue: ProviderSelection::new("echo", None),
        synthesis: ProviderSelection::new("counting", None),
        transport,
        enable_interruptions: true,
    }
}

pub fn media_link(buffer: usize) -> (mpsc::Sender<Frame>, mpsc::Receiver<Frame>, MediaLink) {
    let (inbound_tx, inbound_rx) = mpsc::channel(buffer);
    let (outbound_tx, outbound_rx) = mpsc::channel(buffer);
    (
        inbound_tx,
        outbound_rx,
        MediaLink {
            inbound: inbound_rx,
            outbound: outbound_tx,
        },
    )
}

pub fn audio() -> Frame {
    Frame::Audio(AudioChunk::mono_16k(vec![1; 320]))
}

// ============================================================================
// Stores and collaborators
// ============================================================================

/// Call store that counts updates
#[derive(Default)]
pub struct CountingCallStore {
    pub inner: MemoryCallStore,
    pub updates: AtomicUsize,
}

#[async_trait]
impl CallStore for CountingCallStore {
    async fn get(&self, call_id: &str) -> Result<Option<CallRecord>> {
        self.inner.get(call_id).await
    }

    async fn update(&self, call_id: &str, update: CallUpdate) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(call_id, update).await
    }

    async fn open(&self, request: &CallRequest) -> Result<()> {
        self.inner.open(request).await
    }
}

/// Results store that counts upserts
#[derive(Default)]
pub struct CountingResultsStore {
    pub inner: MemoryResultsStore,
    pub upserts: AtomicUsize,
}

#[async_trait]
impl ResultsStore for CountingResultsStore {
    async fn upsert(&self, results: CallResults) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(results).await
    }
}

pub struct FailingExtractor;

#[async_trait]
impl Extractor for FailingExtractor {
    async fn extract(
        &self,
        _call_id: &str,
        _transcript: &str,
        _context: &CallContext,
    ) -> Result<CallResults> {
        bail!("extraction model unavailable")
    }
}

pub struct FailingRoomProvider {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl RoomProvider for FailingRoomProvider {
    async fn provision(
        &self,
        _session_id: &str,
        _expiry: Duration,
    ) -> Result<RoomGrant, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Provider("rooms returned 503".to_string()))
    }
}

pub struct UnreachableMedia;

#[async_trait]
impl RoomMedia for UnreachableMedia {
    async fn join(&self, room_url: &str, _token: &str) -> Result<MediaLink, TransportError> {
        Err(TransportError::Provider(format!("cannot join {}", room_url)))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub orchestrator: Arc<SessionOrchestrator>,
    pub registry: Arc<SessionRegistry>,
    pub hub: SocketHub,
    pub calls: Arc<CountingCallStore>,
    pub results: Arc<CountingResultsStore>,
    pub room_provider: Arc<FailingRoomProvider>,
}

pub async fn harness(script: &[&str]) -> Harness {
    harness_with_extractor(script, Arc::new(DefaultExtractor::new())).await
}

pub async fn harness_with_extractor(script: &[&str], extractor: Arc<dyn Extractor>) -> Harness {
    let registry = Arc::new(SessionRegistry::new());
    let hub = SocketHub::new(16);
    let room_provider = Arc::new(FailingRoomProvider {
        attempts: AtomicUsize::new(0),
    });

    let mut transports = TransportRegistry::new();
    transports
        .register(Arc::new(ManagedSocketTransport::new(hub.clone(), "ws://localhost:8080")))
        .register(Arc::new(RoomTransport::new(
            room_provider.clone(),
            Arc::new(UnreachableMedia),
            Duration::from_secs(3600),
        )));

    let calls = Arc::new(CountingCallStore::default());
    calls
        .inner
        .insert(CallRecord {
            id: CALL_ID.to_string(),
            driver_name: Some("Mike".to_string()),
            load_number: Some("LD-42".to_string()),
            status: "in_progress".to_string(),
            ..Default::default()
        })
        .await;
    let results = Arc::new(CountingResultsStore::default());

    let orchestrator = Arc::new(SessionOrchestrator::new(OrchestratorParts {
        registry: registry.clone(),
        transports,
        stages: stages(script),
        calls: calls.clone(),
        results: results.clone(),
        extractor,
        costs: CostEstimator::default(),
        retry: RetryPolicy::none(),
    }));

    Harness {
        orchestrator,
        registry,
        hub,
        calls,
        results,
        room_provider,
    }
}

/// Poll until the registry reports the session completed
pub async fn wait_completed(registry: &SessionRegistry, session_id: &str) -> Result<()> {
    for _ in 0..200 {
        if registry.is_completed(session_id).await {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    bail!("session {} never completed", session_id)
}

/// Receive frames until `count` arrive or a second passes
pub async fn collect_frames(rx: &mut mpsc::Receiver<Frame>, count: usize) -> Vec<Frame> {
    let mut frames = Vec::new();
    while frames.len() < count {
        match tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
            Ok(Some(frame)) => frames.push(frame),
            _ => break,
        }
    }
    frames
}
