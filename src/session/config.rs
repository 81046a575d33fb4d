use serde::{Deserialize, Serialize};
use std::fmt;

/// A provider tag plus an optional model override for one pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSelection {
    /// Provider tag used to look up the stage constructor (e.g., "deepgram")
    pub provider: String,

    /// Model override; pricing falls back to the provider default when unset
    #[serde(default)]
    pub model: Option<String>,
}

impl ProviderSelection {
    pub fn new(provider: impl Into<String>, model: Option<&str>) -> Self {
        Self {
            provider: provider.into(),
            model: model.map(str::to_string),
        }
    }
}

/// Real-time channel carrying a session's audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Time-boxed room on an external WebRTC provider
    #[serde(alias = "daily_webrtc")]
    Room,
    /// Websocket endpoint served by this process
    #[serde(alias = "websocket")]
    Socket,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Room => "room",
            TransportKind::Socket => "socket",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider and transport choices for one session. Never mutated after start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Speech recognition provider
    pub recognition: ProviderSelection,

    /// Dialogue (LLM) provider
    pub dialogue: ProviderSelection,

    /// Speech synthesis provider
    pub synthesis: ProviderSelection,

    /// Transport used to reach the caller
    pub transport: TransportKind,

    /// Whether caller speech may interrupt synthesized output
    pub enable_interruptions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            recognition: ProviderSelection::new("deepgram", Some("nova-2")),
            dialogue: ProviderSelection::new("openai", Some("gpt-4o")),
            synthesis: ProviderSelection::new("cartesia", Some("sonic-english")),
            transport: TransportKind::Room,
            enable_interruptions: true,
        }
    }
}
