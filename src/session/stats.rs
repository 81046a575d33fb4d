use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speaker of a transcript entry or context message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => f.write_str("system"),
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// A single captured turn of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who spoke (user or assistant)
    pub role: Role,

    /// Trimmed text of the turn
    pub content: String,

    /// When this entry was captured
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Usage figures and timing for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// When the session was created
    pub start_time: DateTime<Utc>,

    /// When the session ended (set once at finalize)
    pub end_time: Option<DateTime<Utc>>,

    /// Wall-clock duration in seconds (set at most once)
    pub duration_seconds: Option<f64>,

    /// Dialogue input tokens reported by the provider
    pub input_tokens: Option<u64>,

    /// Dialogue output tokens reported by the provider
    pub output_tokens: Option<u64>,

    /// Characters sent to speech synthesis
    pub chars_spoken: Option<u64>,
}

impl SessionMetrics {
    pub fn started_now() -> Self {
        Self {
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: None,
            input_tokens: None,
            output_tokens: None,
            chars_spoken: None,
        }
    }

    /// Freeze end time and duration. Returns false if they were already set.
    pub fn freeze(&mut self) -> bool {
        if self.duration_seconds.is_some() {
            return false;
        }

        let end = *self.end_time.get_or_insert_with(Utc::now);
        let elapsed = end.signed_duration_since(self.start_time);
        self.duration_seconds = Some((elapsed.num_milliseconds() as f64 / 1000.0).max(0.0));
        true
    }

    /// Accumulate metered usage reported by a pipeline stage
    pub fn add_usage(&mut self, input_tokens: u64, output_tokens: u64, chars: u64) {
        if input_tokens > 0 {
            *self.input_tokens.get_or_insert(0) += input_tokens;
        }
        if output_tokens > 0 {
            *self.output_tokens.get_or_insert(0) += output_tokens;
        }
        if chars > 0 {
            *self.chars_spoken.get_or_insert(0) += chars;
        }
    }

    /// Total metered dialogue tokens, if any were reported
    pub fn total_tokens(&self) -> Option<u64> {
        match (self.input_tokens, self.output_tokens) {
            (None, None) => None,
            (i, o) => Some(i.unwrap_or(0) + o.unwrap_or(0)),
        }
    }
}
