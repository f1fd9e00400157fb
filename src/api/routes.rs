use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, AppState};
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(handlers::search::search))
        // Movies
        .route(
            "/movies",
            get(handlers::movies::list).post(handlers::movies::create),
        )
        .route("/movies/filter", get(handlers::movies::filter))
        .route("/movies/trending", get(handlers::movies::trending))
        .route("/movies/:id", get(handlers::movies::get_by_id))
        .route(
            "/movies/:id/interactions",
            get(handlers::interactions::by_movie),
        )
        .route("/movies/:id/status", get(handlers::library::status))
        .route("/movies/:id/toggle/:kind", post(handlers::library::toggle))
        // Interactions
        .route(
            "/interactions",
            get(handlers::interactions::list).post(handlers::interactions::create),
        )
        .route("/interactions/filter", get(handlers::interactions::filter))
        .route("/interactions/:id", delete(handlers::interactions::remove))
        // Library
        .route("/library", get(handlers::library::profile))
}
