use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::completion::{DefaultExtractor, MemoryCallStore, MemoryResultsStore, RetryPolicy};
use crate::config::Config;
use crate::cost::CostEstimator;
use crate::http::{create_router, AppState};
use crate::orchestrator::{OrchestratorParts, SessionOrchestrator};
use crate::pipeline::StageRegistry;
use crate::session::SessionRegistry;
use crate::transport::{
    HttpRoomProvider, ManagedSocketTransport, RoomMedia, RoomTransport, SocketHub,
    TransportRegistry,
};

/// A wired-up service: orchestrator, router, and the sweeper's shutdown switch
pub struct App {
    pub orchestrator: Arc<SessionOrchestrator>,
    pub router: Router,
    pub calls: MemoryCallStore,
    pub results: MemoryResultsStore,
    sweeper: watch::Sender<bool>,
}

impl App {
    /// Build the service from config.
    ///
    /// Provider stages come from the embedder. The room transport is only
    /// registered when both a `[room]` section and a media client exist.
    pub fn build(
        cfg: &Config,
        stages: StageRegistry,
        room_media: Option<Arc<dyn RoomMedia>>,
    ) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let hub = SocketHub::new(cfg.sessions.channel_size);

        let mut transports = TransportRegistry::new();
        transports.register(Arc::new(ManagedSocketTransport::new(
            hub.clone(),
            cfg.socket.public_base_url.clone(),
        )));

        match (&cfg.room, room_media) {
            (Some(room), Some(media)) => {
                let provider =
                    HttpRoomProvider::new(&room.api_url, &room.api_key, room.max_participants);
                transports.register(Arc::new(RoomTransport::new(
                    Arc::new(provider),
                    media,
                    room.expiry(),
                )));
                info!("Room transport enabled via {}", room.api_url);
            }
            (Some(_), None) => warn!("Room transport configured but no media client available"),
            _ => {}
        }

        if stages.is_empty() {
            warn!("No provider stages registered; sessions cannot be started");
        }

        let calls = MemoryCallStore::new();
        let results = MemoryResultsStore::new();

        let orchestrator = Arc::new(SessionOrchestrator::new(OrchestratorParts {
            registry: registry.clone(),
            transports,
            stages,
            calls: Arc::new(calls.clone()),
            results: Arc::new(results.clone()),
            extractor: Arc::new(DefaultExtractor::new()),
            costs: CostEstimator::default(),
            retry: RetryPolicy::default(),
        }));

        let sweeper =
            registry.start_sweeper(cfg.sessions.sweep_interval(), cfg.sessions.retention());
        let router = create_router(AppState::new(orchestrator.clone(), hub));

        Self {
            orchestrator,
            router,
            calls,
            results,
            sweeper,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.sweeper.send(true);
    }
}

/// Serve the HTTP surface until the process is interrupted
pub async fn serve(cfg: &Config, app: App) -> Result<()> {
    let addr = cfg.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app.router.clone())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    app.shutdown();
    Ok(())
}
