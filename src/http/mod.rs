//! HTTP control surface
//!
//! - GET /health - Health check
//! - POST /sessions - Start a session
//! - GET /sessions - List active sessions
//! - GET /sessions/:id - Session status
//! - POST /sessions/:id/end - End a session
//! - GET /sessions/:id/ws - Websocket for socket-transport sessions

mod handlers;
mod routes;
mod socket;
mod state;

pub use handlers::{
    ActiveSessionsResponse, ErrorResponse, StartSessionRequest, StartSessionResponse,
};
pub use routes::create_router;
pub use state::AppState;
