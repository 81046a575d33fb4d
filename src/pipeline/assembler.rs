use std::sync::Arc;
use tracing::info;

use super::context::ConversationContext;
use super::processor::{FrameProcessor, FrameSource};
use super::providers::StageRegistry;
use super::stages::{ContextAppend, TranscriptCapture, TransportInput, TransportOutput};
use crate::error::{SessionError, SessionResult};
use crate::session::{PipelineConfig, Session};
use crate::transport::MediaLink;

/// An assembled processing chain for one session.
///
/// Frames enter at `source` and flow through `stages` in order.
pub struct Chain {
    pub source: Box<dyn FrameSource>,
    pub stages: Vec<Box<dyn FrameProcessor>>,
}

impl Chain {
    /// Names of every stage, head first
    pub fn stage_names(&self) -> Vec<String> {
        std::iter::once(self.source.name().to_string())
            .chain(self.stages.iter().map(|stage| stage.name().to_string()))
            .collect()
    }
}

/// Builds session chains from a pipeline config
#[derive(Clone)]
pub struct PipelineAssembler {
    stages: StageRegistry,
}

impl PipelineAssembler {
    pub fn new(stages: StageRegistry) -> Self {
        Self { stages }
    }

    /// Check every provider tag before anything is provisioned
    pub fn validate(&self, config: &PipelineConfig) -> SessionResult<()> {
        if self.stages.recognition(&config.recognition.provider).is_none() {
            return Err(unsupported("recognition", &config.recognition.provider));
        }
        if self.stages.dialogue(&config.dialogue.provider).is_none() {
            return Err(unsupported("dialogue", &config.dialogue.provider));
        }
        if self.stages.synthesis(&config.synthesis.provider).is_none() {
            return Err(unsupported("synthesis", &config.synthesis.provider));
        }
        Ok(())
    }

    /// Build the chain for `session` over an open media link.
    ///
    /// Seeds the dialogue context with the system prompt and stores it on the
    /// session runtime. The order of stages is fixed:
    /// transport-input, recognition, transcript-capture(user),
    /// context-append(user), dialogue, transcript-capture(assistant),
    /// synthesis, transport-output, context-append(assistant).
    pub async fn build(&self, session: &Arc<Session>, link: MediaLink) -> SessionResult<Chain> {
        let (config, system_prompt) = {
            let record = session.record().await;
            (record.pipeline_config.clone(), record.system_prompt.clone())
        };

        let recognition = self
            .stages
            .recognition(&config.recognition.provider)
            .ok_or_else(|| unsupported("recognition", &config.recognition.provider))?;
        let dialogue = self
            .stages
            .dialogue(&config.dialogue.provider)
            .ok_or_else(|| unsupported("dialogue", &config.dialogue.provider))?;
        let synthesis = self
            .stages
            .synthesis(&config.synthesis.provider)
            .ok_or_else(|| unsupported("synthesis", &config.synthesis.provider))?;

        let context = ConversationContext::seeded(&system_prompt);

        let stages: Vec<Box<dyn FrameProcessor>> = vec![
            recognition(&config.recognition)?,
            Box::new(TranscriptCapture::user(session.clone())),
            Box::new(ContextAppend::user(context.clone(), config.enable_interruptions)),
            dialogue(&config.dialogue, context.clone())?,
            Box::new(TranscriptCapture::assistant(session.clone())),
            synthesis(&config.synthesis)?,
            Box::new(TransportOutput::new(link.outbound)),
            Box::new(ContextAppend::assistant(context.clone())),
        ];

        session.runtime().await.context = Some(context);

        let chain = Chain {
            source: Box::new(TransportInput::new(link.inbound)),
            stages,
        };

        info!(
            "Assembled pipeline for session {} ({} / {} / {} over {})",
            session.id(),
            config.recognition.provider,
            config.dialogue.provider,
            config.synthesis.provider,
            config.transport
        );

        Ok(chain)
    }
}

fn unsupported(stage: &'static str, provider: &str) -> SessionError {
    SessionError::UnsupportedProvider {
        stage,
        provider: provider.to_string(),
    }
}
