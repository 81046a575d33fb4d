use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::{ConnectionInfo, MediaLink, TransportError, TransportStrategy};
use crate::session::TransportKind;

/// Credentials for a provisioned room
#[derive(Debug, Clone, PartialEq)]
pub struct RoomGrant {
    pub room_url: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Creates time-boxed rooms on an external WebRTC provider
#[async_trait]
pub trait RoomProvider: Send + Sync {
    async fn provision(
        &self,
        session_id: &str,
        expiry: Duration,
    ) -> Result<RoomGrant, TransportError>;
}

/// Joins a provisioned room and exposes its audio as frames.
///
/// Implemented by the media stack; this crate only drives it.
#[async_trait]
pub trait RoomMedia: Send + Sync {
    async fn join(&self, room_url: &str, token: &str) -> Result<MediaLink, TransportError>;
}

/// Room provider backed by a REST API (`/rooms` and `/meeting-tokens`)
pub struct HttpRoomProvider {
    client: reqwest::Client,
    api_base_url: String,
    api_key: String,
    max_participants: u32,
}

#[derive(Debug, Deserialize)]
struct RoomResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

impl HttpRoomProvider {
    pub fn new(
        api_base_url: impl Into<String>,
        api_key: impl Into<String>,
        max_participants: u32,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_participants,
        }
    }

    /// Room names use the first 8 characters of the session id
    pub fn room_name(session_id: &str) -> String {
        let prefix: String = session_id.chars().take(8).collect();
        format!("session-{}", prefix)
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, TransportError> {
        let url = format!("{}/{}", self.api_base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach room provider at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Room provider rejected {}: {} {}", path, status, detail);
            return Err(TransportError::Provider(format!(
                "{} returned {}: {}",
                path, status, detail
            )));
        }

        let parsed = response
            .json::<T>()
            .await
            .with_context(|| format!("Malformed response from {}", path))?;
        Ok(parsed)
    }
}

#[async_trait]
impl RoomProvider for HttpRoomProvider {
    async fn provision(
        &self,
        session_id: &str,
        expiry: Duration,
    ) -> Result<RoomGrant, TransportError> {
        if self.api_key.is_empty() {
            return Err(TransportError::NotConfigured {
                kind: TransportKind::Room,
                reason: "room provider API key is empty".to_string(),
            });
        }

        let room_name = Self::room_name(session_id);
        let expires_at = Utc::now()
            + chrono::Duration::from_std(expiry).context("Room expiry out of range")?;
        let exp = expires_at.timestamp();

        info!("Creating room {} for session: {}", room_name, session_id);

        let room: RoomResponse = self
            .post(
                "rooms",
                json!({
                    "name": room_name,
                    "properties": {
                        "exp": exp,
                        "enable_chat": false,
                        "enable_emoji_reactions": false,
                        "max_participants": self.max_participants,
                    }
                }),
            )
            .await?;

        let token: TokenResponse = self
            .post(
                "meeting-tokens",
                json!({
                    "properties": {
                        "room_name": room_name,
                        "is_owner": true,
                        "exp": exp,
                    }
                }),
            )
            .await?;

        Ok(RoomGrant {
            room_url: room.url,
            token: token.token,
            expires_at,
        })
    }
}

/// Room-based transport: provisions a room, then joins it through the media stack
pub struct RoomTransport {
    provider: Arc<dyn RoomProvider>,
    media: Arc<dyn RoomMedia>,
    expiry: Duration,
}

impl RoomTransport {
    pub fn new(
        provider: Arc<dyn RoomProvider>,
        media: Arc<dyn RoomMedia>,
        expiry: Duration,
    ) -> Self {
        Self {
            provider,
            media,
            expiry,
        }
    }
}

#[async_trait]
impl TransportStrategy for RoomTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Room
    }

    async fn start(&self, session_id: &str) -> Result<ConnectionInfo, TransportError> {
        info!("[TRANSPORT:ROOM] Initializing room session {}", session_id);

        let grant = self.provider.provision(session_id, self.expiry).await?;

        Ok(ConnectionInfo::Room {
            room_url: grant.room_url,
            token: grant.token,
            expires_at: grant.expires_at,
        })
    }

    async fn connect(
        &self,
        session_id: &str,
        info: &ConnectionInfo,
    ) -> Result<MediaLink, TransportError> {
        match info {
            ConnectionInfo::Room { room_url, token, .. } => {
                let link = self.media.join(room_url, token).await?;
                info!("[TRANSPORT:ROOM] Session {} joined {}", session_id, room_url);
                Ok(link)
            }
            ConnectionInfo::Socket { .. } => {
                Err(TransportError::LinkUnavailable(session_id.to_string()))
            }
        }
    }
}
