//! Router assembly and serving.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth;
use crate::routes;
use crate::state::AppState;

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/metrics", get(routes::health::metrics))
        .route("/account_info", get(routes::account::account_info))
        .route("/get_positions", get(routes::position::get_positions))
        .route("/positions_total", get(routes::position::positions_total))
        .route("/order", post(routes::order::send_order))
        .route("/close_position", post(routes::position::close_position))
        .route("/modify_sl_tp", post(routes::position::modify_sl_tp))
        .route(
            "/close_all_positions",
            post(routes::position::close_all_positions),
        )
        .route(
            "/close_positions_batch",
            post(routes::position::close_positions_batch),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on an already-bound listener until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = create_router(state);
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Serving HTTP API");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
