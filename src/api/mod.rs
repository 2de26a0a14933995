pub mod ws;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::dispatch::Dispatcher;

/// Shared state for the WebSocket surface.
#[derive(Clone)]
pub struct WsState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the notification API router.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/notification-service", get(ws::ws_notifications))
        .with_state(WsState { dispatcher })
}
