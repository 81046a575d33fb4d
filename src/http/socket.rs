use super::state::AppState;
use crate::pipeline::{AudioChunk, Frame};
use crate::transport::SocketClient;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

const INTERRUPT_MESSAGE: &str = r#"{"type":"interrupt"}"#;
const SAMPLE_RATE: u32 = 16000;

/// GET /sessions/:session_id/ws
/// Attach the caller to a socket-transport session
pub async fn session_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, StatusCode> {
    let client = state
        .sockets
        .attach(&session_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    info!("Caller attached to session {}", session_id);
    Ok(ws.on_upgrade(move |socket| bridge(socket, client, session_id)))
}

/// Pump frames between the websocket and the session chain until either side
/// closes. Binary messages carry 16-bit little-endian mono PCM.
async fn bridge(socket: WebSocket, client: SocketClient, session_id: String) {
    let SocketClient {
        to_session,
        mut from_session,
    } = client;
    let (mut sender, mut receiver) = socket.split();

    let outbound = tokio::spawn(async move {
        while let Some(frame) = from_session.recv().await {
            let message = match frame {
                Frame::Speech(chunk) => Message::Binary(chunk.to_le_bytes()),
                Frame::Interrupt => Message::Text(INTERRUPT_MESSAGE.to_string()),
                other => {
                    debug!("Not sending {} frame to caller", other.kind());
                    continue;
                }
            };
            if sender.send(message).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Binary(bytes)) => {
                let chunk = AudioChunk::from_le_bytes(&bytes, SAMPLE_RATE, 1);
                if to_session.send(Frame::Audio(chunk)).await.is_err() {
                    debug!("Session {} stopped accepting audio", session_id);
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Websocket error on session {}: {}", session_id, e);
                break;
            }
        }
    }

    // Closing inbound lets the chain drain and complete on its own
    drop(to_session);
    let _ = outbound.await;
    info!("Caller disconnected from session {}", session_id);
}
