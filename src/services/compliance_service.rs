//! Compliance Service
//!
//! Audit reference data, per-control self-assessments, and the two derived
//! reports: the compliance score and the C2M2 maturity summary.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::{Permission, UserContext},
    error::ApiError,
    models::{
        AssessmentStatus, AssessmentSubmission, AssessmentUpsert, AssessmentWithPractices,
        AuditAssessment, AuditControl, AuditFramework, C2M2MaturityFrameworkSummaryResponse,
        ComplianceScoreResponse, MAX_MIL, MAX_PRACTICE_ID_LEN,
    },
    repositories::AuditRepository,
    require_permission,
    services::{maturity, notification_service::Notifier},
};

/// Aggregate the assessments of one organization over a framework's controls.
///
/// Assessments for controls outside `controls` are ignored. Not-applicable
/// assessments count as evaluated but fall in none of the three status buckets.
pub fn compute_compliance_score(
    organization_id: Uuid,
    framework_id: Uuid,
    controls: &[AuditControl],
    assessments: &[AuditAssessment],
) -> ComplianceScoreResponse {
    let by_control: HashMap<Uuid, &AuditAssessment> = assessments
        .iter()
        .map(|a| (a.audit_control_id, a))
        .collect();

    let mut response = ComplianceScoreResponse {
        organization_id,
        framework_id,
        total_controls: controls.len() as i64,
        evaluated_controls: 0,
        conformant_controls: 0,
        partially_conformant_controls: 0,
        non_conformant_controls: 0,
        score: 0.0,
    };

    let mut score_sum: i64 = 0;
    for control in controls {
        let Some(assessment) = by_control.get(&control.id) else {
            continue;
        };

        response.evaluated_controls += 1;
        score_sum += i64::from(assessment.score);

        match assessment.status {
            AssessmentStatus::Conformant => response.conformant_controls += 1,
            AssessmentStatus::PartiallyConformant => response.partially_conformant_controls += 1,
            AssessmentStatus::NonConformant => response.non_conformant_controls += 1,
            AssessmentStatus::NotApplicable => {}
        }
    }

    if response.evaluated_controls > 0 {
        response.score = score_sum as f64 / response.evaluated_controls as f64;
    }

    response
}

pub struct ComplianceService {
    audit_repo: Arc<dyn AuditRepository + Send + Sync>,
    notifier: Arc<dyn Notifier>,
}

impl ComplianceService {
    pub fn new(
        audit_repo: Arc<dyn AuditRepository + Send + Sync>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            audit_repo,
            notifier,
        }
    }

    pub async fn list_frameworks(&self) -> Result<Vec<AuditFramework>, ApiError> {
        self.audit_repo.list_frameworks().await
    }

    pub async fn list_controls(&self, framework_id: Uuid) -> Result<Vec<AuditControl>, ApiError> {
        self.require_framework(framework_id).await?;
        self.audit_repo.list_controls(framework_id).await
    }

    pub async fn submit_assessment(
        &self,
        ctx: &UserContext,
        organization_id: Uuid,
        mut submission: AssessmentSubmission,
    ) -> Result<AssessmentWithPractices, ApiError> {
        ctx.ensure_organization(organization_id)?;
        require_permission!(ctx, Permission::SubmitAssessment);

        validate_submission(&mut submission)?;

        if self
            .audit_repo
            .get_control(submission.audit_control_id)
            .await?
            .is_none()
        {
            return Err(ApiError::not_found(format!(
                "Audit control {} not found",
                submission.audit_control_id
            )));
        }

        let score = submission.effective_score();
        let upsert = AssessmentUpsert {
            organization_id,
            audit_control_id: submission.audit_control_id,
            status: submission.status,
            score,
            evidence_url: submission.evidence_url,
            assessment_date: submission.assessment_date,
            comments: submission.comments,
            c2m2_assessment_date: submission.c2m2_assessment_date,
            c2m2_comments: submission.c2m2_comments,
            assessed_by: ctx.user_id,
            practice_evaluations: submission.practice_evaluations,
        };

        let saved = self.audit_repo.upsert_assessment(&upsert).await?;

        tracing::info!(
            organization_id = %organization_id,
            audit_control_id = %upsert.audit_control_id,
            assessment_id = %saved.assessment.id,
            status = ?upsert.status,
            score,
            practices = saved.practice_evaluations.len(),
            "Assessment upserted"
        );
        self.notifier
            .notify_org_event(organization_id, "audit_assessment", "upserted");

        Ok(saved)
    }

    pub async fn list_assessments(
        &self,
        ctx: &UserContext,
        organization_id: Uuid,
        framework_id: Uuid,
    ) -> Result<Vec<AssessmentWithPractices>, ApiError> {
        ctx.ensure_organization(organization_id)?;
        require_permission!(ctx, Permission::ViewCompliance);
        self.require_framework(framework_id).await?;

        let assessments = self
            .audit_repo
            .list_assessments(organization_id, framework_id)
            .await?;
        let ids: Vec<Uuid> = assessments.iter().map(|a| a.id).collect();
        let practices = self.audit_repo.list_practice_evaluations(&ids).await?;

        let mut by_assessment: HashMap<Uuid, Vec<_>> = HashMap::new();
        for practice in practices {
            by_assessment
                .entry(practice.assessment_id)
                .or_default()
                .push(practice);
        }

        Ok(assessments
            .into_iter()
            .map(|assessment| AssessmentWithPractices {
                practice_evaluations: by_assessment.remove(&assessment.id).unwrap_or_default(),
                assessment,
            })
            .collect())
    }

    pub async fn clear_evidence(
        &self,
        ctx: &UserContext,
        organization_id: Uuid,
        assessment_id: Uuid,
    ) -> Result<AuditAssessment, ApiError> {
        ctx.ensure_organization(organization_id)?;
        require_permission!(ctx, Permission::SubmitAssessment);

        let cleared = self
            .audit_repo
            .clear_evidence(organization_id, assessment_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Assessment {} not found", assessment_id)))?;

        tracing::info!(
            organization_id = %organization_id,
            assessment_id = %assessment_id,
            "Assessment evidence cleared"
        );
        self.notifier
            .notify_org_event(organization_id, "audit_assessment", "evidence_cleared");

        Ok(cleared)
    }

    pub async fn compliance_score(
        &self,
        ctx: &UserContext,
        organization_id: Uuid,
        framework_id: Uuid,
    ) -> Result<ComplianceScoreResponse, ApiError> {
        ctx.ensure_organization(organization_id)?;
        require_permission!(ctx, Permission::ViewCompliance);
        self.require_framework(framework_id).await?;

        let controls = self.audit_repo.list_controls(framework_id).await?;
        let assessments = self
            .audit_repo
            .list_assessments(organization_id, framework_id)
            .await?;

        let response =
            compute_compliance_score(organization_id, framework_id, &controls, &assessments);
        tracing::debug!(
            organization_id = %organization_id,
            framework_id = %framework_id,
            evaluated = response.evaluated_controls,
            total = response.total_controls,
            score = response.score,
            "Compliance score computed"
        );

        Ok(response)
    }

    pub async fn maturity_summary(
        &self,
        ctx: &UserContext,
        organization_id: Uuid,
        framework_id: Uuid,
    ) -> Result<C2M2MaturityFrameworkSummaryResponse, ApiError> {
        ctx.ensure_organization(organization_id)?;
        require_permission!(ctx, Permission::ViewCompliance);
        self.require_framework(framework_id).await?;

        let controls = self.audit_repo.list_controls(framework_id).await?;
        let assessments = self
            .audit_repo
            .list_assessments(organization_id, framework_id)
            .await?;
        let ids: Vec<Uuid> = assessments.iter().map(|a| a.id).collect();
        let practices = self.audit_repo.list_practice_evaluations(&ids).await?;

        Ok(C2M2MaturityFrameworkSummaryResponse {
            organization_id,
            framework_id,
            functions: maturity::summarize(&controls, &assessments, &practices),
        })
    }

    async fn require_framework(&self, framework_id: Uuid) -> Result<AuditFramework, ApiError> {
        self.audit_repo
            .get_framework(framework_id)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(format!("Audit framework {} not found", framework_id))
            })
    }
}

/// Checks the submission and normalizes practice ids in place.
fn validate_submission(submission: &mut AssessmentSubmission) -> Result<(), ApiError> {
    if let Some(score) = submission.score {
        if !(0..=100).contains(&score) {
            return Err(ApiError::validation(format!(
                "Score must be between 0 and 100, got {}",
                score
            )));
        }
    }

    let mut seen = HashSet::new();
    for practice in &mut submission.practice_evaluations {
        let id = practice.practice_id.trim();
        if id.is_empty() {
            return Err(ApiError::validation("Practice id must not be empty"));
        }
        if id.chars().count() > MAX_PRACTICE_ID_LEN {
            return Err(ApiError::validation(format!(
                "Practice id must be at most {} characters",
                MAX_PRACTICE_ID_LEN
            )));
        }
        if !(1..=MAX_MIL).contains(&practice.mil_level) {
            return Err(ApiError::validation(format!(
                "Practice {} has MIL {}, expected 1 to {}",
                id, practice.mil_level, MAX_MIL
            )));
        }
        if !seen.insert(id.to_string()) {
            return Err(ApiError::validation(format!("Practice {} submitted twice", id)));
        }
        practice.practice_id = id.to_string();
    }

    Ok(())
}
