use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::c2m2::{C2M2PracticeEvaluation, PracticeEvaluationInput};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditFramework {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditControl {
    pub id: Uuid,
    pub framework_id: Uuid,
    pub control_code: String,
    pub family: String,
    pub description: Option<String>,
    pub display_order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "assessment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Conformant,
    PartiallyConformant,
    NonConformant,
    NotApplicable,
}

impl AssessmentStatus {
    /// Score recorded when the assessor does not supply one.
    pub fn default_score(self) -> i32 {
        match self {
            AssessmentStatus::Conformant => 100,
            AssessmentStatus::PartiallyConformant => 50,
            AssessmentStatus::NonConformant | AssessmentStatus::NotApplicable => 0,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditAssessment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub audit_control_id: Uuid,
    pub status: AssessmentStatus,
    pub score: i32,
    pub evidence_url: Option<String>,
    pub assessment_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub c2m2_assessment_date: Option<NaiveDate>,
    pub c2m2_comments: Option<String>,
    pub assessed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of an assessment submission for one control.
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentSubmission {
    pub audit_control_id: Uuid,
    pub status: AssessmentStatus,
    pub score: Option<i32>,
    pub evidence_url: Option<String>,
    pub assessment_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub c2m2_assessment_date: Option<NaiveDate>,
    pub c2m2_comments: Option<String>,
    #[serde(default)]
    pub practice_evaluations: Vec<PracticeEvaluationInput>,
}

impl AssessmentSubmission {
    pub fn effective_score(&self) -> i32 {
        self.score.unwrap_or_else(|| self.status.default_score())
    }
}

/// Validated values handed to the repository upsert.
#[derive(Debug, Clone)]
pub struct AssessmentUpsert {
    pub organization_id: Uuid,
    pub audit_control_id: Uuid,
    pub status: AssessmentStatus,
    pub score: i32,
    pub evidence_url: Option<String>,
    pub assessment_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub c2m2_assessment_date: Option<NaiveDate>,
    pub c2m2_comments: Option<String>,
    pub assessed_by: Uuid,
    pub practice_evaluations: Vec<PracticeEvaluationInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentWithPractices {
    #[serde(flatten)]
    pub assessment: AuditAssessment,
    pub practice_evaluations: Vec<C2M2PracticeEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScoreResponse {
    pub organization_id: Uuid,
    pub framework_id: Uuid,
    pub total_controls: i64,
    pub evaluated_controls: i64,
    pub conformant_controls: i64,
    pub partially_conformant_controls: i64,
    pub non_conformant_controls: i64,
    pub score: f64,
}
