use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware, AppState};

/// Full HTTP surface: public health checks plus identity-protected API routes.
pub fn build_router(app_state: AppState) -> Router {
    let cors_layer = middleware::create_cors_layer(
        app_state.config.cors_allow_origins.clone(),
        &app_state.config.api_key_header,
    );

    // Public routes
    let public_routes = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/health/ready", get(handlers::readiness_check))
        .route("/api/health/live", get(handlers::liveness_check));

    // Protected routes (require identity headers, and an API key when configured)
    let protected_routes = Router::new()
        // Risk register
        .route(
            "/api/risks",
            get(handlers::risk_handlers::list_risks).post(handlers::risk_handlers::create_risk),
        )
        .route(
            "/api/risks/:id",
            get(handlers::risk_handlers::get_risk).put(handlers::risk_handlers::update_risk),
        )
        // Stakeholders
        .route(
            "/api/risks/:id/stakeholders",
            get(handlers::stakeholder_handlers::list_stakeholders)
                .post(handlers::stakeholder_handlers::add_stakeholder),
        )
        .route(
            "/api/risks/:id/stakeholders/:user_id",
            delete(handlers::stakeholder_handlers::remove_stakeholder),
        )
        // Acceptance workflow
        .route(
            "/api/risks/:id/submit-acceptance",
            post(handlers::approval_handlers::submit_acceptance),
        )
        .route(
            "/api/risks/:id/approval/:approval_id/decide",
            post(handlers::approval_handlers::decide),
        )
        .route(
            "/api/risks/:id/approval-history",
            get(handlers::approval_handlers::approval_history),
        )
        // Audit frameworks and self-assessment
        .route("/api/audit/frameworks", get(handlers::audit_handlers::list_frameworks))
        .route(
            "/api/audit/frameworks/:framework_id/controls",
            get(handlers::audit_handlers::list_controls),
        )
        .route(
            "/api/audit/organizations/:org_id/assessments",
            post(handlers::audit_handlers::submit_assessment),
        )
        .route(
            "/api/audit/organizations/:org_id/frameworks/:framework_id/assessments",
            get(handlers::audit_handlers::list_assessments),
        )
        .route(
            "/api/audit/organizations/:org_id/assessments/:assessment_id/evidence",
            delete(handlers::audit_handlers::clear_evidence),
        )
        .route(
            "/api/audit/organizations/:org_id/frameworks/:framework_id/compliance-score",
            get(handlers::audit_handlers::compliance_score),
        )
        .route(
            "/api/audit/organizations/:org_id/frameworks/:framework_id/maturity-summary",
            get(handlers::audit_handlers::maturity_summary),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::request_logging_middleware))
        .layer(middleware::create_logging_layer())
        .layer(cors_layer)
}
