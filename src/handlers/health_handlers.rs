use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::time::Instant;

use crate::{database, error::ApiError, AppState};

/// Health check with database connectivity
pub async fn health_check(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = check_database_health(&app_state).await;

    if !database["healthy"].as_bool().unwrap_or(false) {
        return Err(ApiError::internal("Service is unhealthy"));
    }

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "grc-backend",
        "checks": { "database": database }
    })))
}

async fn check_database_health(app_state: &AppState) -> Value {
    let started = Instant::now();
    match database::health_check(&app_state.db_pool).await {
        Ok(()) => json!({
            "healthy": true,
            "response_time_ms": started.elapsed().as_millis() as u64
        }),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            json!({
                "healthy": false,
                "message": "Database connection failed"
            })
        }
    }
}

/// Readiness check for orchestrators
pub async fn readiness_check(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = check_database_health(&app_state).await;

    if !database["healthy"].as_bool().unwrap_or(false) {
        return Err(ApiError::internal("Service is not ready"));
    }

    Ok(Json(json!({
        "ready": true,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "checks": { "database": database }
    })))
}

/// Liveness check: responding is enough
pub async fn liveness_check() -> Json<Value> {
    Json(json!({
        "alive": true,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
