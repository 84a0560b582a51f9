//! Router setup with all routes and middleware.

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use omnibus_core::error::OmnibusError;

use crate::handlers;
use crate::state::AppState;

/// Request bodies are a single question; anything larger is rejected early.
const BODY_LIMIT: usize = 64 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Allow the page's own origin, by address and by localhost name.
    let port = state.config.general.port;
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
        format!("http://{}:{}", state.config.general.bind_addr, port),
    ]
    .iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/api/messages",
            get(handlers::list_messages)
                .post(handlers::ask)
                .delete(handlers::reset),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the router on `general.bind_addr:general.port` until `shutdown`
/// resolves.
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<(), OmnibusError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!(
        "{}:{}",
        state.config.general.bind_addr, state.config.general.port
    );
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OmnibusError::Api(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Chat server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| OmnibusError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
