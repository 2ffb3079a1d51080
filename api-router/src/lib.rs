use api_state::ApiState;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use routes::{
    chat::chat,
    health::{live, ready},
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Unauthenticated probes for systemd/k8s
    Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live))
}

/// `POST /chat`, mounted at the root to keep the path the chat page posts to.
pub fn chat_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new().route("/chat", post(chat))
}
