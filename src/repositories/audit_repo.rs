use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{
        AssessmentUpsert, AssessmentWithPractices, AuditAssessment, AuditControl, AuditFramework,
        C2M2PracticeEvaluation,
    },
};

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn list_frameworks(&self) -> Result<Vec<AuditFramework>, ApiError>;
    async fn get_framework(&self, id: Uuid) -> Result<Option<AuditFramework>, ApiError>;
    async fn list_controls(&self, framework_id: Uuid) -> Result<Vec<AuditControl>, ApiError>;
    async fn get_control(&self, id: Uuid) -> Result<Option<AuditControl>, ApiError>;

    /// Assessments of `organization_id` for controls belonging to `framework_id`.
    async fn list_assessments(
        &self,
        organization_id: Uuid,
        framework_id: Uuid,
    ) -> Result<Vec<AuditAssessment>, ApiError>;

    async fn list_practice_evaluations(
        &self,
        assessment_ids: &[Uuid],
    ) -> Result<Vec<C2M2PracticeEvaluation>, ApiError>;

    /// Insert-or-update keyed by (organization, control), together with the
    /// practice evaluations keyed by (assessment, practice), in one transaction.
    async fn upsert_assessment(
        &self,
        upsert: &AssessmentUpsert,
    ) -> Result<AssessmentWithPractices, ApiError>;

    async fn clear_evidence(
        &self,
        organization_id: Uuid,
        assessment_id: Uuid,
    ) -> Result<Option<AuditAssessment>, ApiError>;
}

pub struct SqlxAuditRepository {
    pool: DatabasePool,
}

impl SqlxAuditRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for SqlxAuditRepository {
    async fn list_frameworks(&self) -> Result<Vec<AuditFramework>, ApiError> {
        let rows = sqlx::query_as::<_, AuditFramework>(
            "SELECT id, name, description, created_at FROM audit_frameworks ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_framework(&self, id: Uuid) -> Result<Option<AuditFramework>, ApiError> {
        let row = sqlx::query_as::<_, AuditFramework>(
            "SELECT id, name, description, created_at FROM audit_frameworks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_controls(&self, framework_id: Uuid) -> Result<Vec<AuditControl>, ApiError> {
        let rows = sqlx::query_as::<_, AuditControl>(
            r#"
            SELECT id, framework_id, control_code, family, description, display_order
            FROM audit_controls
            WHERE framework_id = $1
            ORDER BY display_order, control_code
            "#,
        )
        .bind(framework_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_control(&self, id: Uuid) -> Result<Option<AuditControl>, ApiError> {
        let row = sqlx::query_as::<_, AuditControl>(
            r#"
            SELECT id, framework_id, control_code, family, description, display_order
            FROM audit_controls
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_assessments(
        &self,
        organization_id: Uuid,
        framework_id: Uuid,
    ) -> Result<Vec<AuditAssessment>, ApiError> {
        let rows = sqlx::query_as::<_, AuditAssessment>(
            r#"
            SELECT a.id, a.organization_id, a.audit_control_id, a.status, a.score,
                   a.evidence_url, a.assessment_date, a.comments, a.c2m2_assessment_date,
                   a.c2m2_comments, a.assessed_by, a.created_at, a.updated_at
            FROM audit_assessments a
            JOIN audit_controls c ON c.id = a.audit_control_id
            WHERE a.organization_id = $1 AND c.framework_id = $2
            ORDER BY c.display_order, c.control_code
            "#,
        )
        .bind(organization_id)
        .bind(framework_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_practice_evaluations(
        &self,
        assessment_ids: &[Uuid],
    ) -> Result<Vec<C2M2PracticeEvaluation>, ApiError> {
        if assessment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, C2M2PracticeEvaluation>(
            r#"
            SELECT id, assessment_id, practice_id, mil_level, status, updated_at
            FROM c2m2_practice_evaluations
            WHERE assessment_id = ANY($1)
            ORDER BY assessment_id, mil_level, practice_id
            "#,
        )
        .bind(assessment_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn upsert_assessment(
        &self,
        upsert: &AssessmentUpsert,
    ) -> Result<AssessmentWithPractices, ApiError> {
        let mut tx = self.pool.begin().await?;

        let assessment = sqlx::query_as::<_, AuditAssessment>(
            r#"
            INSERT INTO audit_assessments (id, organization_id, audit_control_id, status, score,
                                           evidence_url, assessment_date, comments,
                                           c2m2_assessment_date, c2m2_comments, assessed_by,
                                           created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
            ON CONFLICT (organization_id, audit_control_id) DO UPDATE SET
                status = EXCLUDED.status,
                score = EXCLUDED.score,
                evidence_url = COALESCE(EXCLUDED.evidence_url, audit_assessments.evidence_url),
                assessment_date = EXCLUDED.assessment_date,
                comments = EXCLUDED.comments,
                c2m2_assessment_date = EXCLUDED.c2m2_assessment_date,
                c2m2_comments = EXCLUDED.c2m2_comments,
                assessed_by = EXCLUDED.assessed_by,
                updated_at = NOW()
            RETURNING id, organization_id, audit_control_id, status, score, evidence_url,
                      assessment_date, comments, c2m2_assessment_date, c2m2_comments,
                      assessed_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(upsert.organization_id)
        .bind(upsert.audit_control_id)
        .bind(upsert.status)
        .bind(upsert.score)
        .bind(&upsert.evidence_url)
        .bind(upsert.assessment_date)
        .bind(&upsert.comments)
        .bind(upsert.c2m2_assessment_date)
        .bind(&upsert.c2m2_comments)
        .bind(upsert.assessed_by)
        .fetch_one(&mut *tx)
        .await?;

        for practice in &upsert.practice_evaluations {
            sqlx::query(
                r#"
                INSERT INTO c2m2_practice_evaluations (id, assessment_id, practice_id, mil_level,
                                                       status, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                ON CONFLICT (assessment_id, practice_id) DO UPDATE SET
                    mil_level = EXCLUDED.mil_level,
                    status = EXCLUDED.status,
                    updated_at = NOW()
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(assessment.id)
            .bind(&practice.practice_id)
            .bind(practice.mil_level)
            .bind(practice.status)
            .execute(&mut *tx)
            .await?;
        }

        let practice_evaluations = sqlx::query_as::<_, C2M2PracticeEvaluation>(
            r#"
            SELECT id, assessment_id, practice_id, mil_level, status, updated_at
            FROM c2m2_practice_evaluations
            WHERE assessment_id = $1
            ORDER BY mil_level, practice_id
            "#,
        )
        .bind(assessment.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AssessmentWithPractices {
            assessment,
            practice_evaluations,
        })
    }

    async fn clear_evidence(
        &self,
        organization_id: Uuid,
        assessment_id: Uuid,
    ) -> Result<Option<AuditAssessment>, ApiError> {
        let row = sqlx::query_as::<_, AuditAssessment>(
            r#"
            UPDATE audit_assessments
            SET evidence_url = NULL, updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING id, organization_id, audit_control_id, status, score, evidence_url,
                      assessment_date, comments, c2m2_assessment_date, c2m2_comments,
                      assessed_by, created_at, updated_at
            "#,
        )
        .bind(assessment_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
