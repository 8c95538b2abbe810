use async_trait::async_trait;
use uuid::Uuid;

use crate::{database::DatabasePool, error::ApiError, models::RiskStakeholder};

/// Many-to-many membership between risks and users.
#[async_trait]
pub trait StakeholderRepository: Send + Sync {
    /// Returns `false` when the user was already a stakeholder.
    async fn add(&self, risk_id: Uuid, user_id: Uuid) -> Result<bool, ApiError>;
    /// Returns `false` when the user was not a stakeholder.
    async fn remove(&self, risk_id: Uuid, user_id: Uuid) -> Result<bool, ApiError>;
    async fn list(&self, risk_id: Uuid) -> Result<Vec<RiskStakeholder>, ApiError>;
}

pub struct SqlxStakeholderRepository {
    pool: DatabasePool,
}

impl SqlxStakeholderRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StakeholderRepository for SqlxStakeholderRepository {
    async fn add(&self, risk_id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"
            INSERT INTO risk_stakeholders (risk_id, user_id, added_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (risk_id, user_id) DO NOTHING
            "#,
        )
        .bind(risk_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, risk_id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
        let result =
            sqlx::query("DELETE FROM risk_stakeholders WHERE risk_id = $1 AND user_id = $2")
                .bind(risk_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, risk_id: Uuid) -> Result<Vec<RiskStakeholder>, ApiError> {
        let rows = sqlx::query_as::<_, RiskStakeholder>(
            r#"
            SELECT rs.risk_id, rs.user_id, u.email, u.name, rs.added_at
            FROM risk_stakeholders rs
            JOIN users u ON u.id = rs.user_id
            WHERE rs.risk_id = $1
            ORDER BY rs.added_at, u.email
            "#,
        )
        .bind(risk_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
