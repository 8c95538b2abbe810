use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::{Permission, UserContext},
    error::ApiError,
    models::{Risk, RiskStakeholder},
    repositories::{RiskRepository, StakeholderRepository},
    require_permission,
};

/// Membership of users in a risk's stakeholder set.
pub struct StakeholderService {
    risk_repo: Arc<dyn RiskRepository + Send + Sync>,
    stakeholder_repo: Arc<dyn StakeholderRepository + Send + Sync>,
}

impl StakeholderService {
    pub fn new(
        risk_repo: Arc<dyn RiskRepository + Send + Sync>,
        stakeholder_repo: Arc<dyn StakeholderRepository + Send + Sync>,
    ) -> Self {
        Self {
            risk_repo,
            stakeholder_repo,
        }
    }

    pub async fn list(
        &self,
        ctx: &UserContext,
        risk_id: Uuid,
    ) -> Result<Vec<RiskStakeholder>, ApiError> {
        require_permission!(ctx, Permission::ViewRisks);
        self.load_risk(ctx, risk_id).await?;
        self.stakeholder_repo.list(risk_id).await
    }

    /// Adding an existing stakeholder is a no-op.
    pub async fn add(
        &self,
        ctx: &UserContext,
        risk_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<RiskStakeholder>, ApiError> {
        let risk = self.load_risk(ctx, risk_id).await?;
        ensure_can_manage(ctx, &risk)?;

        if !self
            .risk_repo
            .user_in_organization(ctx.organization_id, user_id)
            .await?
        {
            return Err(ApiError::validation(format!(
                "User {} is not a member of this organization",
                user_id
            )));
        }

        let inserted = self.stakeholder_repo.add(risk_id, user_id).await?;
        tracing::info!(risk_id = %risk_id, user_id = %user_id, inserted, "Stakeholder added");

        self.stakeholder_repo.list(risk_id).await
    }

    pub async fn remove(
        &self,
        ctx: &UserContext,
        risk_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ApiError> {
        let risk = self.load_risk(ctx, risk_id).await?;
        ensure_can_manage(ctx, &risk)?;

        if !self.stakeholder_repo.remove(risk_id, user_id).await? {
            return Err(ApiError::not_found(format!(
                "User {} is not a stakeholder of risk {}",
                user_id, risk_id
            )));
        }

        tracing::info!(risk_id = %risk_id, user_id = %user_id, "Stakeholder removed");
        Ok(())
    }

    async fn load_risk(&self, ctx: &UserContext, risk_id: Uuid) -> Result<Risk, ApiError> {
        self.risk_repo
            .get_by_id(ctx.organization_id, risk_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Risk {} not found", risk_id)))
    }
}

fn ensure_can_manage(ctx: &UserContext, risk: &Risk) -> Result<(), ApiError> {
    if risk.owner_id == Some(ctx.user_id) || ctx.has_permission(Permission::ManageStakeholders) {
        return Ok(());
    }
    Err(ApiError::authorization(
        "Only the risk owner, an admin or a manager can manage stakeholders",
    ))
}
