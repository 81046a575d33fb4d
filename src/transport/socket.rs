use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use super::{ConnectionInfo, MediaLink, TransportError, TransportStrategy};
use crate::pipeline::Frame;
use crate::session::TransportKind;

/// The far end of a socket session, held by whoever serves the websocket
pub struct SocketClient {
    /// Frames to feed into the session chain
    pub to_session: mpsc::Sender<Frame>,
    /// Frames the session chain produced for the caller
    pub from_session: mpsc::Receiver<Frame>,
}

#[derive(Default)]
struct Slot {
    link: Option<MediaLink>,
    client: Option<SocketClient>,
}

impl Slot {
    fn is_drained(&self) -> bool {
        self.link.is_none() && self.client.is_none()
    }
}

/// In-process rendezvous between session chains and websocket connections.
///
/// `register` creates both channel pairs; the chain takes its side with
/// `take_link`, the websocket handler takes the other with `attach`.
#[derive(Clone)]
pub struct SocketHub {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    buffer: usize,
}

impl SocketHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    pub async fn register(&self, session_id: &str) {
        let (inbound_tx, inbound_rx) = mpsc::channel(self.buffer);
        let (outbound_tx, outbound_rx) = mpsc::channel(self.buffer);

        let slot = Slot {
            link: Some(MediaLink {
                inbound: inbound_rx,
                outbound: outbound_tx,
            }),
            client: Some(SocketClient {
                to_session: inbound_tx,
                from_session: outbound_rx,
            }),
        };

        self.slots.lock().await.insert(session_id.to_string(), slot);
        debug!("Registered socket slot for session {}", session_id);
    }

    /// Take the client side of a session's socket. Only one client may attach.
    pub async fn attach(&self, session_id: &str) -> Option<SocketClient> {
        self.take(session_id, |slot| slot.client.take()).await
    }

    pub async fn take_link(&self, session_id: &str) -> Option<MediaLink> {
        self.take(session_id, |slot| slot.link.take()).await
    }

    pub async fn remove(&self, session_id: &str) {
        self.slots.lock().await.remove(session_id);
    }

    pub async fn is_registered(&self, session_id: &str) -> bool {
        self.slots.lock().await.contains_key(session_id)
    }

    async fn take<T>(
        &self,
        session_id: &str,
        pick: impl FnOnce(&mut Slot) -> Option<T>,
    ) -> Option<T> {
        let mut slots = self.slots.lock().await;
        let slot = slots.get_mut(session_id)?;
        let taken = pick(slot);
        if slot.is_drained() {
            slots.remove(session_id);
        }
        taken
    }
}

/// Socket transport served by this process; no external provisioning
pub struct ManagedSocketTransport {
    hub: SocketHub,
    public_base_url: String,
}

impl ManagedSocketTransport {
    pub fn new(hub: SocketHub, public_base_url: impl Into<String>) -> Self {
        Self {
            hub,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn hub(&self) -> &SocketHub {
        &self.hub
    }
}

#[async_trait]
impl TransportStrategy for ManagedSocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Socket
    }

    async fn start(&self, session_id: &str) -> Result<ConnectionInfo, TransportError> {
        info!("[TRANSPORT:SOCKET] Initializing socket session {}", session_id);

        self.hub.register(session_id).await;

        Ok(ConnectionInfo::Socket {
            url: format!("{}/sessions/{}/ws", self.public_base_url, session_id),
        })
    }

    async fn connect(
        &self,
        session_id: &str,
        _info: &ConnectionInfo,
    ) -> Result<MediaLink, TransportError> {
        self.hub
            .take_link(session_id)
            .await
            .ok_or_else(|| TransportError::LinkUnavailable(session_id.to_string()))
    }

    async fn release(&self, session_id: &str) {
        self.hub.remove(session_id).await;
    }
}
