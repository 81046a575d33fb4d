//! Transports carrying a session's audio
//!
//! Every transport is a `TransportStrategy`: it provisions whatever the far
//! end needs to connect (`start`) and then opens the media link the chain
//! reads from and writes to (`connect`). Strategies are looked up by
//! `TransportKind` in a `TransportRegistry`.

mod room;
mod socket;

pub use room::{HttpRoomProvider, RoomGrant, RoomMedia, RoomProvider, RoomTransport};
pub use socket::{ManagedSocketTransport, SocketClient, SocketHub};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::pipeline::Frame;
use crate::session::TransportKind;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{kind} transport is not configured: {reason}")]
    NotConfigured { kind: TransportKind, reason: String },

    #[error("Room provider request failed: {0}")]
    Provider(String),

    #[error("Media link unavailable for session '{0}'")]
    LinkUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Transport-specific details the caller needs to reach the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum ConnectionInfo {
    Room {
        room_url: String,
        token: String,
        expires_at: DateTime<Utc>,
    },
    Socket {
        url: String,
    },
}

/// The chain's side of a live media connection
pub struct MediaLink {
    /// Frames arriving from the caller
    pub inbound: mpsc::Receiver<Frame>,
    /// Frames to deliver to the caller
    pub outbound: mpsc::Sender<Frame>,
}

#[async_trait]
pub trait TransportStrategy: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Provision the transport resource for a session
    async fn start(&self, session_id: &str) -> Result<ConnectionInfo, TransportError>;

    /// Open the media link for a provisioned session
    async fn connect(
        &self,
        session_id: &str,
        info: &ConnectionInfo,
    ) -> Result<MediaLink, TransportError>;

    /// Release anything `start` reserved when the session never launched.
    /// Provider-side expiry handles rooms, so the default does nothing.
    async fn release(&self, _session_id: &str) {}
}

/// Transport strategies keyed by kind
#[derive(Default, Clone)]
pub struct TransportRegistry {
    strategies: HashMap<TransportKind, Arc<dyn TransportStrategy>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, strategy: Arc<dyn TransportStrategy>) -> &mut Self {
        self.strategies.insert(strategy.kind(), strategy);
        self
    }

    pub fn get(&self, kind: TransportKind) -> Option<Arc<dyn TransportStrategy>> {
        self.strategies.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<TransportKind> {
        let mut kinds: Vec<_> = self.strategies.keys().copied().collect();
        kinds.sort();
        kinds
    }
}
