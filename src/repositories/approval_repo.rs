use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{
        ApprovalStatus, ApprovalWorkflow, ApprovalWorkflowCreate, Decision, Pagination,
        RiskStatus,
    },
};

#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    async fn find_pending(&self, risk_id: Uuid) -> Result<Option<ApprovalWorkflow>, ApiError>;

    /// Inserts a pending workflow. A second pending workflow for the same risk
    /// fails with `Conflict`.
    async fn create(
        &self,
        workflow: &ApprovalWorkflowCreate,
    ) -> Result<ApprovalWorkflow, ApiError>;

    /// Looks up a workflow through its risk, scoped to the organization.
    async fn get_for_risk(
        &self,
        organization_id: Uuid,
        risk_id: Uuid,
        approval_id: Uuid,
    ) -> Result<Option<ApprovalWorkflow>, ApiError>;

    /// Applies a decision atomically: the workflow leaves `pending` and, for an
    /// approval, the risk becomes `accepted`. Either both writes land or neither.
    async fn record_decision(
        &self,
        organization_id: Uuid,
        risk_id: Uuid,
        approval_id: Uuid,
        decision: Decision,
        comments: Option<String>,
    ) -> Result<ApprovalWorkflow, ApiError>;

    async fn list_by_risk(
        &self,
        risk_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<ApprovalWorkflow>, ApiError>;

    async fn count_by_risk(&self, risk_id: Uuid) -> Result<i64, ApiError>;
}

pub struct SqlxApprovalRepository {
    pool: DatabasePool,
}

impl SqlxApprovalRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalRepository for SqlxApprovalRepository {
    async fn find_pending(&self, risk_id: Uuid) -> Result<Option<ApprovalWorkflow>, ApiError> {
        let row = sqlx::query_as::<_, ApprovalWorkflow>(
            r#"
            SELECT id, risk_id, requester_id, approver_id, status, comments,
                   created_at, updated_at, decided_at
            FROM approval_workflows
            WHERE risk_id = $1 AND status = 'pending'
            "#,
        )
        .bind(risk_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(
        &self,
        workflow: &ApprovalWorkflowCreate,
    ) -> Result<ApprovalWorkflow, ApiError> {
        sqlx::query_as::<_, ApprovalWorkflow>(
            r#"
            INSERT INTO approval_workflows (id, risk_id, requester_id, approver_id, status,
                                            created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'pending', NOW(), NOW())
            RETURNING id, risk_id, requester_id, approver_id, status, comments,
                      created_at, updated_at, decided_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(workflow.risk_id)
        .bind(workflow.requester_id)
        .bind(workflow.approver_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            ApiError::conflict_on_unique_violation(
                e,
                format!(
                    "Risk {} already has a pending acceptance request",
                    workflow.risk_id
                ),
            )
        })
    }

    async fn get_for_risk(
        &self,
        organization_id: Uuid,
        risk_id: Uuid,
        approval_id: Uuid,
    ) -> Result<Option<ApprovalWorkflow>, ApiError> {
        let row = sqlx::query_as::<_, ApprovalWorkflow>(
            r#"
            SELECT aw.id, aw.risk_id, aw.requester_id, aw.approver_id, aw.status, aw.comments,
                   aw.created_at, aw.updated_at, aw.decided_at
            FROM approval_workflows aw
            JOIN risks r ON r.id = aw.risk_id
            WHERE aw.id = $1 AND aw.risk_id = $2 AND r.organization_id = $3
            "#,
        )
        .bind(approval_id)
        .bind(risk_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn record_decision(
        &self,
        organization_id: Uuid,
        risk_id: Uuid,
        approval_id: Uuid,
        decision: Decision,
        comments: Option<String>,
    ) -> Result<ApprovalWorkflow, ApiError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent deciders; the loser sees a terminal status.
        let current = sqlx::query_as::<_, ApprovalWorkflow>(
            r#"
            SELECT aw.id, aw.risk_id, aw.requester_id, aw.approver_id, aw.status, aw.comments,
                   aw.created_at, aw.updated_at, aw.decided_at
            FROM approval_workflows aw
            JOIN risks r ON r.id = aw.risk_id
            WHERE aw.id = $1 AND aw.risk_id = $2 AND r.organization_id = $3
            FOR UPDATE OF aw
            "#,
        )
        .bind(approval_id)
        .bind(risk_id)
        .bind(organization_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("Approval workflow {} not found", approval_id))
        })?;

        let next: ApprovalStatus = current.status.transition(decision)?;

        let updated = sqlx::query_as::<_, ApprovalWorkflow>(
            r#"
            UPDATE approval_workflows
            SET status = $2, comments = $3, decided_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, risk_id, requester_id, approver_id, status, comments,
                      created_at, updated_at, decided_at
            "#,
        )
        .bind(approval_id)
        .bind(next)
        .bind(&comments)
        .fetch_one(&mut *tx)
        .await?;

        if next == ApprovalStatus::Approved {
            sqlx::query(
                r#"
                UPDATE risks SET status = $3, updated_at = NOW()
                WHERE id = $1 AND organization_id = $2
                "#,
            )
            .bind(risk_id)
            .bind(organization_id)
            .bind(RiskStatus::Accepted)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    async fn list_by_risk(
        &self,
        risk_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<ApprovalWorkflow>, ApiError> {
        let rows = sqlx::query_as::<_, ApprovalWorkflow>(
            r#"
            SELECT id, risk_id, requester_id, approver_id, status, comments,
                   created_at, updated_at, decided_at
            FROM approval_workflows
            WHERE risk_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(risk_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_by_risk(&self, risk_id: Uuid) -> Result<i64, ApiError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM approval_workflows WHERE risk_id = $1",
        )
        .bind(risk_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
