use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RiskStakeholder {
    pub risk_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakeholderAdd {
    pub user_id: Uuid,
}
