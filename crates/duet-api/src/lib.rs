pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// Participant-facing WebSocket endpoints.
pub fn gateway_router(state: ApiState) -> Router {
    Router::new()
        .route("/ws/chat", get(handlers::handle_chat_ws))
        .route("/ws/call", get(handlers::handle_call_ws))
        .with_state(state)
}

/// Operator JSON API, mounted under `/api`.
pub fn api_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/status", get(handlers::handle_status))
        .route(
            "/brokers/{broker}/sessions",
            get(handlers::handle_sessions),
        )
        .route(
            "/brokers/{broker}/sessions/{id}",
            get(handlers::handle_session_inspect),
        )
        .route("/blocks", get(handlers::handle_block_list))
        .route("/blocks/add", post(handlers::handle_block_add))
        .route("/blocks/remove", post(handlers::handle_block_remove))
        .route("/daemon/shutdown", post(handlers::handle_shutdown))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}

/// Serve `app` until a shutdown signal arrives.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    tracing::info!(%addr, "server stopped");
    Ok(())
}
