//! Route definitions and shared application state.

use crate::adapter::Authorizer;
use crate::handlers;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Per-request handler timeout. Generous relative to the key-set fetch
/// timeout so the pipeline's own bound fires first.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The authorizer service, shared across handlers.
    pub authorizer: Arc<Authorizer>,
}

/// Build the service router.
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/authorize", get(handlers::authorize::authorize))
        .route("/healthz", get(handlers::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}
