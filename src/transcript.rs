//! Transcript recovery and formatting
//!
//! The capture stages fill a session's transcript while the chain runs. When
//! nothing was captured (e.g. the chain was cancelled before a capture stage
//! saw a complete turn) the transcript is rebuilt from the dialogue context.

use serde::Serialize;

use crate::pipeline::ContextMessage;
use crate::session::{Role, TranscriptEntry};

/// Pick the transcript to persist.
///
/// A non-empty capture buffer always wins. Otherwise user and assistant turns
/// with content are taken from the context log, in order; the seeded system
/// message is dropped.
pub fn recover(captured: &[TranscriptEntry], context: &[ContextMessage]) -> Vec<TranscriptEntry> {
    if !captured.is_empty() {
        return captured.to_vec();
    }

    context
        .iter()
        .filter(|msg| matches!(msg.role, Role::User | Role::Assistant))
        .filter(|msg| !msg.content.trim().is_empty())
        .map(|msg| TranscriptEntry::new(msg.role, msg.content.trim()))
        .collect()
}

/// Render a transcript as `ROLE: content` blocks separated by blank lines
pub fn format_transcript(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .filter(|entry| !entry.content.is_empty())
        .map(|entry| format!("{}: {}", entry.role.to_string().to_uppercase(), entry.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageCounts {
    pub user: usize,
    pub assistant: usize,
    pub total: usize,
}

pub fn message_counts(transcript: &[TranscriptEntry]) -> MessageCounts {
    let mut counts = MessageCounts {
        total: transcript.len(),
        ..Default::default()
    };
    for entry in transcript {
        match entry.role {
            Role::User => counts.user += 1,
            Role::Assistant => counts.assistant += 1,
            Role::System => {}
        }
    }
    counts
}
