use crate::{
    auth::context::UserContext,
    error::ApiError,
    models::{RiskStakeholder, StakeholderAdd},
    AppState,
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

/// GET /api/risks/:id/stakeholders
pub async fn list_stakeholders(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(risk_id): Path<Uuid>,
) -> Result<Json<Vec<RiskStakeholder>>, ApiError> {
    let stakeholders = app_state.stakeholder_service.list(&user, risk_id).await?;
    Ok(Json(stakeholders))
}

/// POST /api/risks/:id/stakeholders - Idempotent; returns the updated set
pub async fn add_stakeholder(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(risk_id): Path<Uuid>,
    Json(payload): Json<StakeholderAdd>,
) -> Result<Json<Vec<RiskStakeholder>>, ApiError> {
    let stakeholders = app_state
        .stakeholder_service
        .add(&user, risk_id, payload.user_id)
        .await?;
    Ok(Json(stakeholders))
}

/// DELETE /api/risks/:id/stakeholders/:user_id
pub async fn remove_stakeholder(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path((risk_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .stakeholder_service
        .remove(&user, risk_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
