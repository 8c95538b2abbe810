use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{Pagination, Risk, RiskChanges, RiskFilter},
};

#[async_trait]
pub trait RiskRepository: Send + Sync {
    async fn insert(&self, risk: &Risk) -> Result<Risk, ApiError>;
    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Risk>, ApiError>;
    async fn list(
        &self,
        organization_id: Uuid,
        filter: &RiskFilter,
        pagination: Pagination,
    ) -> Result<Vec<Risk>, ApiError>;
    async fn count(&self, organization_id: Uuid, filter: &RiskFilter) -> Result<i64, ApiError>;
    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        changes: &RiskChanges,
    ) -> Result<Risk, ApiError>;
    async fn user_in_organization(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ApiError>;
}

pub struct SqlxRiskRepository {
    pool: DatabasePool,
}

impl SqlxRiskRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RiskRepository for SqlxRiskRepository {
    async fn insert(&self, risk: &Risk) -> Result<Risk, ApiError> {
        let row = sqlx::query_as::<_, Risk>(
            r#"
            INSERT INTO risks (id, organization_id, title, description, category, impact,
                               probability, risk_level, status, owner_id, created_by,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, organization_id, title, description, category, impact, probability,
                      risk_level, status, owner_id, created_by, created_at, updated_at
            "#,
        )
        .bind(risk.id)
        .bind(risk.organization_id)
        .bind(&risk.title)
        .bind(&risk.description)
        .bind(risk.category)
        .bind(risk.impact)
        .bind(risk.probability)
        .bind(risk.risk_level)
        .bind(risk.status)
        .bind(risk.owner_id)
        .bind(risk.created_by)
        .bind(risk.created_at)
        .bind(risk.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Risk>, ApiError> {
        let row = sqlx::query_as::<_, Risk>(
            r#"
            SELECT id, organization_id, title, description, category, impact, probability,
                   risk_level, status, owner_id, created_by, created_at, updated_at
            FROM risks
            WHERE id = $1 AND organization_id = $2
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        filter: &RiskFilter,
        pagination: Pagination,
    ) -> Result<Vec<Risk>, ApiError> {
        let rows = sqlx::query_as::<_, Risk>(
            r#"
            SELECT id, organization_id, title, description, category, impact, probability,
                   risk_level, status, owner_id, created_by, created_at, updated_at
            FROM risks
            WHERE organization_id = $1
              AND ($2::risk_status IS NULL OR status = $2)
              AND ($3::risk_category IS NULL OR category = $3)
            ORDER BY created_at DESC, id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(organization_id)
        .bind(filter.status)
        .bind(filter.category)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self, organization_id: Uuid, filter: &RiskFilter) -> Result<i64, ApiError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM risks
            WHERE organization_id = $1
              AND ($2::risk_status IS NULL OR status = $2)
              AND ($3::risk_category IS NULL OR category = $3)
            "#,
        )
        .bind(organization_id)
        .bind(filter.status)
        .bind(filter.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        changes: &RiskChanges,
    ) -> Result<Risk, ApiError> {
        let row = sqlx::query_as::<_, Risk>(
            r#"
            UPDATE risks SET
                title = COALESCE($3, title),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                category = COALESCE($6::risk_category, category),
                impact = COALESCE($7::risk_severity, impact),
                probability = COALESCE($8::risk_severity, probability),
                risk_level = COALESCE($9::risk_severity, risk_level),
                status = COALESCE($10::risk_status, status),
                owner_id = CASE WHEN $11 THEN $12 ELSE owner_id END,
                updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING id, organization_id, title, description, category, impact, probability,
                      risk_level, status, owner_id, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(&changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .bind(changes.category)
        .bind(changes.impact)
        .bind(changes.probability)
        .bind(changes.risk_level)
        .bind(changes.status)
        .bind(changes.owner_id.is_some())
        .bind(changes.owner_id.flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Risk {} not found", id)))?;

        Ok(row)
    }

    async fn user_in_organization(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ApiError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND organization_id = $2)",
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
