use super::handlers;
use super::socket;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Session control
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::start_session),
        )
        .route("/sessions/:session_id", get(handlers::get_session_status))
        .route("/sessions/:session_id/end", post(handlers::end_session))
        // Socket transport
        .route("/sessions/:session_id/ws", get(socket::session_socket))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
