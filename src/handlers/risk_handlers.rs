use crate::{
    auth::context::UserContext,
    error::ApiError,
    models::{Page, PageQuery, Risk, RiskCategory, RiskCreate, RiskFilter, RiskStatus, RiskUpdate},
    AppState,
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RiskListQuery {
    pub status: Option<RiskStatus>,
    pub category: Option<RiskCategory>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/risks - List risks of the caller's organization
pub async fn list_risks(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Query(query): Query<RiskListQuery>,
) -> Result<Json<Page<Risk>>, ApiError> {
    let pagination = PageQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(
        app_state.config.default_page_size,
        app_state.config.max_page_size,
    );
    let filter = RiskFilter {
        status: query.status,
        category: query.category,
    };

    let page = app_state
        .risk_service
        .list_risks(&user, filter, pagination)
        .await?;
    Ok(Json(page))
}

/// POST /api/risks - Register a new risk
pub async fn create_risk(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Json(payload): Json<RiskCreate>,
) -> Result<(StatusCode, Json<Risk>), ApiError> {
    let risk = app_state.risk_service.create_risk(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(risk)))
}

/// GET /api/risks/:id
pub async fn get_risk(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Risk>, ApiError> {
    let risk = app_state.risk_service.get_risk(&user, id).await?;
    Ok(Json(risk))
}

/// PUT /api/risks/:id - Partial update; owner changes need admin or manager
pub async fn update_risk(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RiskUpdate>,
) -> Result<Json<Risk>, ApiError> {
    let risk = app_state.risk_service.update_risk(&user, id, payload).await?;
    Ok(Json(risk))
}
