//! Route definitions for the Stockpile Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - supply management
        .nest("/supplies", supply_routes())
        // Protected routes - consumption history
        .nest("/history", history_routes())
        // Protected routes - maintenance
        .nest("/maintenance", maintenance_routes())
}

/// Supply management routes (protected)
fn supply_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_supplies).post(handlers::create_supply),
        )
        .route(
            "/:supply_id",
            get(handlers::get_supply).delete(handlers::delete_supply),
        )
        .route("/:supply_id/consume", post(handlers::consume_supply))
        .route("/:supply_id/restock", post(handlers::restock_supply))
        .route("/:supply_id/archive", post(handlers::archive_supply))
        .route(
            "/:supply_id/reviews",
            get(handlers::list_reviews).post(handlers::add_review),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Consumption history routes (protected)
fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_histories))
        .route("/export", get(handlers::export_histories))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Maintenance routes (protected)
fn maintenance_routes() -> Router<AppState> {
    Router::new()
        .route("/auto-archive", post(handlers::run_auto_archive))
        .route_layer(middleware::from_fn(auth_middleware))
}
