use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::context::ConversationContext;
use super::frame::Frame;
use super::processor::{FrameProcessor, FrameSource};
use crate::session::{Role, Session};

/// Head of the chain: frames from the caller
pub struct TransportInput {
    inbound: mpsc::Receiver<Frame>,
}

impl TransportInput {
    pub fn new(inbound: mpsc::Receiver<Frame>) -> Self {
        Self { inbound }
    }
}

#[async_trait]
impl FrameSource for TransportInput {
    fn name(&self) -> &str {
        "transport-input"
    }

    async fn next_frame(&mut self) -> Option<Frame> {
        self.inbound.recv().await
    }
}

/// Sends synthesized speech and interruptions to the caller; forwards the rest
pub struct TransportOutput {
    outbound: mpsc::Sender<Frame>,
    caller_gone: bool,
}

impl TransportOutput {
    pub fn new(outbound: mpsc::Sender<Frame>) -> Self {
        Self {
            outbound,
            caller_gone: false,
        }
    }

    async fn deliver(&mut self, frame: Frame) {
        if self.caller_gone {
            return;
        }
        if self.outbound.send(frame).await.is_err() {
            // Inbound closes too once the caller is gone, ending the chain.
            warn!("Caller side of the transport closed; dropping output");
            self.caller_gone = true;
        }
    }
}

#[async_trait]
impl FrameProcessor for TransportOutput {
    fn name(&self) -> &str {
        "transport-output"
    }

    async fn process(&mut self, frame: Frame) -> Result<Vec<Frame>> {
        match frame {
            Frame::Speech(_) | Frame::Interrupt => {
                self.deliver(frame).await;
                Ok(Vec::new())
            }
            other => Ok(vec![other]),
        }
    }
}

/// Which side of the conversation a capture or append stage listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    User,
    Assistant,
}

impl Side {
    fn role(self) -> Role {
        match self {
            Side::User => Role::User,
            Side::Assistant => Role::Assistant,
        }
    }
}

/// Appends complete turns for one side to the session transcript.
///
/// User turns are final transcriptions; assistant turns are the `Text` chunks
/// of one reply, committed on `ResponseEnd`.
pub struct TranscriptCapture {
    session: Arc<Session>,
    side: Side,
    pending: String,
}

impl TranscriptCapture {
    pub fn user(session: Arc<Session>) -> Self {
        Self::new(session, Side::User)
    }

    pub fn assistant(session: Arc<Session>) -> Self {
        Self::new(session, Side::Assistant)
    }

    fn new(session: Arc<Session>, side: Side) -> Self {
        info!(
            "[TRANSCRIPT] Initialized {} capture for session {}",
            side.role(),
            session.id()
        );
        Self {
            session,
            side,
            pending: String::new(),
        }
    }
}

#[async_trait]
impl FrameProcessor for TranscriptCapture {
    fn name(&self) -> &str {
        match self.side {
            Side::User => "transcript-capture(user)",
            Side::Assistant => "transcript-capture(assistant)",
        }
    }

    async fn process(&mut self, frame: Frame) -> Result<Vec<Frame>> {
        match (self.side, &frame) {
            (Side::User, Frame::Transcription { text, is_final: true }) => {
                let text = text.trim();
                if !text.is_empty() {
                    debug!("[TRANSCRIPT] Captured user speech: {}", text);
                    self.session.append_transcript(Role::User, text).await;
                }
            }
            (Side::Assistant, Frame::Text(chunk)) => self.pending.push_str(chunk),
            (Side::Assistant, Frame::ResponseEnd) => {
                let reply = std::mem::take(&mut self.pending);
                let reply = reply.trim();
                if !reply.is_empty() {
                    debug!("[TRANSCRIPT] Captured bot response: {}", reply);
                    self.session.append_transcript(Role::Assistant, reply).await;
                }
            }
            _ => {}
        }
        Ok(vec![frame])
    }
}

/// Appends complete turns for one side to the dialogue context.
///
/// On the user side, a committed turn also emits `Interrupt` ahead of the
/// transcription when interruptions are enabled.
pub struct ContextAppend {
    context: ConversationContext,
    side: Side,
    allow_interruptions: bool,
    pending: String,
}

impl ContextAppend {
    pub fn user(context: ConversationContext, allow_interruptions: bool) -> Self {
        Self {
            context,
            side: Side::User,
            allow_interruptions,
            pending: String::new(),
        }
    }

    pub fn assistant(context: ConversationContext) -> Self {
        Self {
            context,
            side: Side::Assistant,
            allow_interruptions: false,
            pending: String::new(),
        }
    }
}

#[async_trait]
impl FrameProcessor for ContextAppend {
    fn name(&self) -> &str {
        match self.side {
            Side::User => "context-append(user)",
            Side::Assistant => "context-append(assistant)",
        }
    }

    async fn process(&mut self, frame: Frame) -> Result<Vec<Frame>> {
        match (self.side, &frame) {
            (Side::User, Frame::Transcription { text, is_final: true }) => {
                let text = text.trim();
                if !text.is_empty() {
                    self.context.push(Role::User, text).await;
                    if self.allow_interruptions {
                        return Ok(vec![Frame::Interrupt, frame]);
                    }
                }
            }
            (Side::Assistant, Frame::Text(chunk)) => self.pending.push_str(chunk),
            (Side::Assistant, Frame::ResponseEnd) => {
                let reply = std::mem::take(&mut self.pending);
                let reply = reply.trim();
                if !reply.is_empty() {
                    self.context.push(Role::Assistant, reply).await;
                }
            }
            _ => {}
        }
        Ok(vec![frame])
    }
}
