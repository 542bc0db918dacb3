//! Application route configuration.

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{auth_routes, health_check, message_routes, user_routes};
use super::middleware::rate_limit_auth_middleware;
use super::AppState;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Authentication routes are rate limited per client
        .nest(
            "/auth",
            auth_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_auth_middleware,
            )),
        )
        .nest("/users", user_routes())
        .nest("/messages", message_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
