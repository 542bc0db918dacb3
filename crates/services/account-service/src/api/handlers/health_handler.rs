//! Health check handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::api::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub services: ServiceStatus,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub database: ServiceHealth,
    pub redis: ServiceHealth,
}

/// Service health with optional error message.
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy",
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.status != "unhealthy"
    }
}

/// Health check endpoint - pings the database, and Redis when configured.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = ServiceHealth::from_result(state.database.ping().await);
    let redis = match &state.cache {
        Some(cache) => ServiceHealth::from_result(cache.ping().await),
        None => ServiceHealth {
            status: "disabled",
            error: None,
        },
    };

    let all_healthy = database.is_healthy() && redis.is_healthy();
    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" },
        services: ServiceStatus { database, redis },
    };

    if all_healthy {
        (StatusCode::OK, Json(response)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response()
    }
}
