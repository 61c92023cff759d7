use super::{MAX_IMAGE_SIZE_BYTES, handlers};
use crate::remover::SharedRemover;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{IntoMakeService, get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Level;

/// Builds the router with all API endpoints. Exposed separately from
/// [`create_app`] so tests can drive it with `tower::ServiceExt::oneshot`.
pub fn create_router(session: SharedRemover) -> Router<()> {
    Router::new()
        // Liveness endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Background removal
        .route("/remove-bg/", post(handlers::remove_background))
        // Apply a layer to limit the maximum size of request bodies
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE_BYTES))
        // Add CORS layer for broader client compatibility
        .layer(CorsLayer::permissive())
        // Add tracing for HTTP requests and responses
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)))
        // Provide the shared model session
        .with_state(session)
}

pub fn create_app(session: SharedRemover) -> IntoMakeService<Router<()>> {
    create_router(session).into_make_service()
}
