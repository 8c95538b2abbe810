use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }

    /// `pending -> approved | rejected`; terminal states never move again.
    pub fn transition(self, decision: Decision) -> Result<ApprovalStatus, ApiError> {
        match self {
            ApprovalStatus::Pending => Ok(decision.into()),
            decided => Err(ApiError::conflict(format!(
                "Approval workflow was already {}",
                decided.as_str()
            ))),
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome chosen by the approver. The public API speaks Portuguese.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "aprovado", alias = "approved")]
    Approved,
    #[serde(rename = "rejeitado", alias = "rejected")]
    Rejected,
}

impl From<Decision> for ApprovalStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => ApprovalStatus::Approved,
            Decision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApprovalWorkflow {
    pub id: Uuid,
    pub risk_id: Uuid,
    pub requester_id: Uuid,
    pub approver_id: Uuid,
    pub status: ApprovalStatus,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ApprovalWorkflowCreate {
    pub risk_id: Uuid,
    pub requester_id: Uuid,
    pub approver_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
    pub comments: Option<String>,
}
