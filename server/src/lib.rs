//! Vortex arena server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod assets;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod geometry;
pub mod session;
pub mod sim;
pub mod state;
pub mod store;
pub mod ws;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

/// WebSocket endpoint at `/ws`, static assets everywhere else.
pub fn router(app_state: ws::AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .fallback(assets::serve_asset)
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
