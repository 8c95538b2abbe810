use crate::{
    auth::context::UserContext,
    error::ApiError,
    models::{
        AssessmentSubmission, AssessmentWithPractices, AuditAssessment, AuditControl,
        AuditFramework, C2M2MaturityFrameworkSummaryResponse, ComplianceScoreResponse,
    },
    AppState,
};
use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use uuid::Uuid;

/// GET /api/audit/frameworks
pub async fn list_frameworks(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<AuditFramework>>, ApiError> {
    let frameworks = app_state.compliance_service.list_frameworks().await?;
    Ok(Json(frameworks))
}

/// GET /api/audit/frameworks/:framework_id/controls
pub async fn list_controls(
    State(app_state): State<AppState>,
    Path(framework_id): Path<Uuid>,
) -> Result<Json<Vec<AuditControl>>, ApiError> {
    let controls = app_state
        .compliance_service
        .list_controls(framework_id)
        .await?;
    Ok(Json(controls))
}

/// POST /api/audit/organizations/:org_id/assessments - Upsert one control assessment
pub async fn submit_assessment(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<AssessmentSubmission>,
) -> Result<Json<AssessmentWithPractices>, ApiError> {
    let saved = app_state
        .compliance_service
        .submit_assessment(&user, org_id, payload)
        .await?;
    Ok(Json(saved))
}

/// GET /api/audit/organizations/:org_id/frameworks/:framework_id/assessments
pub async fn list_assessments(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path((org_id, framework_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<AssessmentWithPractices>>, ApiError> {
    let assessments = app_state
        .compliance_service
        .list_assessments(&user, org_id, framework_id)
        .await?;
    Ok(Json(assessments))
}

/// DELETE /api/audit/organizations/:org_id/assessments/:assessment_id/evidence
pub async fn clear_evidence(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path((org_id, assessment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<AuditAssessment>, ApiError> {
    let assessment = app_state
        .compliance_service
        .clear_evidence(&user, org_id, assessment_id)
        .await?;
    Ok(Json(assessment))
}

/// GET /api/audit/organizations/:org_id/frameworks/:framework_id/compliance-score
pub async fn compliance_score(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path((org_id, framework_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ComplianceScoreResponse>, ApiError> {
    let score = app_state
        .compliance_service
        .compliance_score(&user, org_id, framework_id)
        .await?;
    Ok(Json(score))
}

/// GET /api/audit/organizations/:org_id/frameworks/:framework_id/maturity-summary
pub async fn maturity_summary(
    State(app_state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path((org_id, framework_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<C2M2MaturityFrameworkSummaryResponse>, ApiError> {
    let summary = app_state
        .compliance_service
        .maturity_summary(&user, org_id, framework_id)
        .await?;
    Ok(Json(summary))
}
