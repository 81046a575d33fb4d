use super::config::PipelineConfig;
use super::session::Session;
use crate::error::{SessionError, SessionResult};
use crate::transport::ConnectionInfo;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

#[derive(Default)]
struct Partitions {
    active: HashMap<String, Arc<Session>>,
    completed: HashMap<String, Arc<Session>>,
}

/// Owns every session, split into active and completed partitions.
///
/// Both partitions sit behind one lock so a session is always in exactly one
/// of them.
#[derive(Default)]
pub struct SessionRegistry {
    partitions: RwLock<Partitions>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new active session
    pub async fn create(
        &self,
        session_id: &str,
        call_id: &str,
        config: PipelineConfig,
        system_prompt: &str,
        transport: ConnectionInfo,
    ) -> SessionResult<Arc<Session>> {
        let mut partitions = self.partitions.write().await;

        if partitions.active.contains_key(session_id)
            || partitions.completed.contains_key(session_id)
        {
            return Err(SessionError::DuplicateSession(session_id.to_string()));
        }

        let session = Arc::new(Session::new(
            session_id,
            call_id,
            config,
            system_prompt,
            transport,
        ));
        partitions
            .active
            .insert(session_id.to_string(), Arc::clone(&session));

        info!("Created new session: {}", session_id);
        Ok(session)
    }

    /// Look up a session, active first, then completed
    pub async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        let partitions = self.partitions.read().await;
        partitions
            .active
            .get(session_id)
            .or_else(|| partitions.completed.get(session_id))
            .cloned()
    }

    pub async fn get_active(&self, session_id: &str) -> Option<Arc<Session>> {
        self.partitions.read().await.active.get(session_id).cloned()
    }

    pub async fn is_completed(&self, session_id: &str) -> bool {
        self.partitions
            .read()
            .await
            .completed
            .contains_key(session_id)
    }

    /// Move a session from active to completed, freezing its duration if unset
    pub async fn mark_completed(&self, session_id: &str) -> SessionResult<()> {
        let mut partitions = self.partitions.write().await;

        let session = partitions
            .active
            .remove(session_id)
            .ok_or_else(|| SessionError::NotActive(session_id.to_string()))?;

        session.record().await.metrics.freeze();
        partitions
            .completed
            .insert(session_id.to_string(), session);

        info!("Session {} marked as completed", session_id);
        Ok(())
    }

    /// Drop an active session that never got running. Used to roll back a
    /// failed start.
    pub async fn discard(&self, session_id: &str) -> bool {
        let removed = self
            .partitions
            .write()
            .await
            .active
            .remove(session_id)
            .is_some();
        if removed {
            warn!("Discarded session {} before launch", session_id);
        }
        removed
    }

    pub async fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.partitions.read().await.active.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn active_count(&self) -> usize {
        self.partitions.read().await.active.len()
    }

    pub async fn completed_count(&self) -> usize {
        self.partitions.read().await.completed.len()
    }

    /// Remove completed sessions that ended more than `max_age` ago
    pub async fn sweep_completed(&self, max_age: Duration) -> usize {
        let max_age =
            chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::weeks(5200));
        let now = Utc::now();
        let mut partitions = self.partitions.write().await;

        let mut expired = Vec::new();
        for (session_id, session) in partitions.completed.iter() {
            let end_time = session.record().await.metrics.end_time;
            if let Some(end_time) = end_time {
                if now.signed_duration_since(end_time) > max_age {
                    expired.push(session_id.clone());
                }
            }
        }

        for session_id in &expired {
            partitions.completed.remove(session_id);
        }

        if !expired.is_empty() {
            info!("Cleaned up {} old completed sessions", expired.len());
        }
        expired.len()
    }

    /// Spawn the periodic sweep of completed sessions.
    ///
    /// Returns a shutdown sender; send `true` to stop the task.
    pub fn start_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        max_age: Duration,
    ) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let registry = Arc::clone(self);

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        registry.sweep_completed(max_age).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Session sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}
