use crate::orchestrator::SessionOrchestrator;
use crate::transport::SocketHub;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SessionOrchestrator>,

    /// Client sides of socket-transport sessions
    pub sockets: SocketHub,
}

impl AppState {
    pub fn new(orchestrator: Arc<SessionOrchestrator>, sockets: SocketHub) -> Self {
        Self {
            orchestrator,
            sockets,
        }
    }
}
