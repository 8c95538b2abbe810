use crate::{
    auth::context::UserContext,
    error::ApiError,
    models::{ApprovalWorkflow, DecisionRequest, Page, PageQuery},
    AppState,
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

/// POST /api/risks/:id/submit-acceptance - Ask the risk owner to accept the risk
pub async fn submit_acceptance(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(risk_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApprovalWorkflow>), ApiError> {
    let workflow = app_state
        .approval_service
        .submit_for_acceptance(&user, risk_id)
        .await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

/// POST /api/risks/:id/approval/:approval_id/decide
///
/// Body: `{"decision": "aprovado" | "rejeitado", "comments": "..."}`
pub async fn decide(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path((risk_id, approval_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<ApprovalWorkflow>, ApiError> {
    let workflow = app_state
        .approval_service
        .decide(&user, risk_id, approval_id, payload)
        .await?;
    Ok(Json(workflow))
}

/// GET /api/risks/:id/approval-history?limit=&offset=
pub async fn approval_history(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(risk_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ApprovalWorkflow>>, ApiError> {
    let pagination = query.resolve(
        app_state.config.default_page_size,
        app_state.config.max_page_size,
    );
    let page = app_state
        .approval_service
        .get_history(&user, risk_id, pagination)
        .await?;
    Ok(Json(page))
}
