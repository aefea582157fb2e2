use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, chat};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router
///
/// `/chat/completions` is an alias of `/chat` for clients that speak the
/// chat-completions convention.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/chat", post(chat::chat_handler))
        .route("/chat/completions", post(chat::chat_handler))
        .layer(TraceLayer::new_for_http())
}
