use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::{Permission, UserContext},
    error::ApiError,
    models::{
        Page, Pagination, Risk, RiskChanges, RiskCreate, RiskFilter, RiskStatus, RiskUpdate,
        Severity,
    },
    repositories::RiskRepository,
    require_permission,
    services::notification_service::Notifier,
};

const MAX_TITLE_LEN: usize = 255;

pub struct RiskService {
    risk_repo: Arc<dyn RiskRepository + Send + Sync>,
    notifier: Arc<dyn Notifier>,
}

impl RiskService {
    pub fn new(
        risk_repo: Arc<dyn RiskRepository + Send + Sync>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            risk_repo,
            notifier,
        }
    }

    pub async fn create_risk(
        &self,
        ctx: &UserContext,
        input: RiskCreate,
    ) -> Result<Risk, ApiError> {
        require_permission!(ctx, Permission::CreateRisk);

        let title = validate_title(&input.title)?;
        let status = input.status.unwrap_or(RiskStatus::Open);
        reject_direct_acceptance(status)?;

        if let Some(owner_id) = input.owner_id {
            self.ensure_member(ctx.organization_id, owner_id).await?;
        }

        let now = Utc::now();
        let risk = Risk {
            id: Uuid::new_v4(),
            organization_id: ctx.organization_id,
            title,
            description: input.description,
            category: input.category,
            impact: input.impact,
            probability: input.probability,
            risk_level: Severity::risk_level(input.impact, input.probability),
            status,
            owner_id: input.owner_id,
            created_by: Some(ctx.user_id),
            created_at: now,
            updated_at: now,
        };

        let created = self.risk_repo.insert(&risk).await?;
        tracing::info!(
            risk_id = %created.id,
            organization_id = %created.organization_id,
            risk_level = ?created.risk_level,
            "Risk created"
        );

        self.notifier
            .notify_org_event(created.organization_id, "risk", "created");
        if let Some(owner_id) = created.owner_id.filter(|owner| *owner != ctx.user_id) {
            self.notify_new_owner(owner_id, &created);
        }

        Ok(created)
    }

    pub async fn list_risks(
        &self,
        ctx: &UserContext,
        filter: RiskFilter,
        pagination: Pagination,
    ) -> Result<Page<Risk>, ApiError> {
        require_permission!(ctx, Permission::ViewRisks);

        let items = self
            .risk_repo
            .list(ctx.organization_id, &filter, pagination)
            .await?;
        let total = self.risk_repo.count(ctx.organization_id, &filter).await?;

        Ok(Page::new(items, total, pagination))
    }

    pub async fn get_risk(&self, ctx: &UserContext, risk_id: Uuid) -> Result<Risk, ApiError> {
        require_permission!(ctx, Permission::ViewRisks);

        self.risk_repo
            .get_by_id(ctx.organization_id, risk_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Risk {} not found", risk_id)))
    }

    pub async fn update_risk(
        &self,
        ctx: &UserContext,
        risk_id: Uuid,
        mut update: RiskUpdate,
    ) -> Result<Risk, ApiError> {
        let risk = self.get_risk(ctx, risk_id).await?;

        let is_owner = risk.owner_id == Some(ctx.user_id);
        if !is_owner && !ctx.has_permission(Permission::EditAnyRisk) {
            return Err(ApiError::authorization(
                "Only the risk owner, an admin or a manager can edit this risk",
            ));
        }

        let owner_changed = update.changes_owner(risk.owner_id);
        if owner_changed {
            require_permission!(ctx, Permission::ReassignRiskOwner);
            if let Some(Some(new_owner)) = update.owner_id {
                self.ensure_member(ctx.organization_id, new_owner).await?;
            }
        }

        if let Some(status) = update.status {
            reject_direct_acceptance(status)?;
        }

        if let Some(title) = update.title.take() {
            update.title = Some(validate_title(&title)?);
        }

        let changes = RiskChanges::from_update(&risk, update);
        let updated = self
            .risk_repo
            .update(ctx.organization_id, risk_id, &changes)
            .await?;

        tracing::info!(
            risk_id = %risk_id,
            updated_by = %ctx.user_id,
            owner_changed,
            "Risk updated"
        );

        self.notifier
            .notify_org_event(updated.organization_id, "risk", "updated");
        if owner_changed {
            if let Some(owner_id) = updated.owner_id {
                self.notify_new_owner(owner_id, &updated);
            }
        }

        Ok(updated)
    }

    async fn ensure_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        if !self
            .risk_repo
            .user_in_organization(organization_id, user_id)
            .await?
        {
            return Err(ApiError::validation(format!(
                "User {} is not a member of this organization",
                user_id
            )));
        }
        Ok(())
    }

    fn notify_new_owner(&self, owner_id: Uuid, risk: &Risk) {
        self.notifier.notify(
            owner_id,
            "Risk assigned to you",
            &format!("You are now the owner of the risk \"{}\".", risk.title),
        );
    }
}

fn validate_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Risk title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::validation(format!(
            "Risk title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

/// Acceptance is only reachable through an approved workflow.
fn reject_direct_acceptance(status: RiskStatus) -> Result<(), ApiError> {
    if status == RiskStatus::Accepted {
        return Err(ApiError::invalid_state(
            "A risk can only be accepted through an approved acceptance request",
        ));
    }
    Ok(())
}
