//! Approval Service
//!
//! Risk-acceptance workflow: a manager submits a risk, its owner decides.
//!
//! State machine for a workflow:
//! - `pending` is the only initial state
//! - `pending -> approved` also moves the risk to `accepted`, in one transaction
//! - `pending -> rejected` leaves the risk untouched
//! - `approved` and `rejected` are terminal; deciding again is a conflict

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::{Permission, UserContext},
    error::ApiError,
    models::{
        ApprovalStatus, ApprovalWorkflow, ApprovalWorkflowCreate, DecisionRequest, Page,
        Pagination, Risk,
    },
    repositories::{ApprovalRepository, RiskRepository, StakeholderRepository},
    require_permission,
    services::notification_service::Notifier,
};

pub struct ApprovalService {
    risk_repo: Arc<dyn RiskRepository + Send + Sync>,
    approval_repo: Arc<dyn ApprovalRepository + Send + Sync>,
    stakeholder_repo: Arc<dyn StakeholderRepository + Send + Sync>,
    notifier: Arc<dyn Notifier>,
}

impl ApprovalService {
    pub fn new(
        risk_repo: Arc<dyn RiskRepository + Send + Sync>,
        approval_repo: Arc<dyn ApprovalRepository + Send + Sync>,
        stakeholder_repo: Arc<dyn StakeholderRepository + Send + Sync>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            risk_repo,
            approval_repo,
            stakeholder_repo,
            notifier,
        }
    }

    /// Open a pending acceptance request addressed to the risk owner.
    pub async fn submit_for_acceptance(
        &self,
        ctx: &UserContext,
        risk_id: Uuid,
    ) -> Result<ApprovalWorkflow, ApiError> {
        require_permission!(ctx, Permission::SubmitRiskAcceptance);

        let risk = self.load_risk(ctx, risk_id).await?;
        let owner_id = risk.owner_id.ok_or_else(|| {
            ApiError::invalid_state(format!(
                "Risk {} has no owner to approve its acceptance",
                risk_id
            ))
        })?;

        // Friendlier message than the unique index; the index still decides races.
        if let Some(pending) = self.approval_repo.find_pending(risk_id).await? {
            return Err(ApiError::conflict(format!(
                "Risk {} already has a pending acceptance request ({})",
                risk_id, pending.id
            )));
        }

        let workflow = self
            .approval_repo
            .create(&ApprovalWorkflowCreate {
                risk_id,
                requester_id: ctx.user_id,
                approver_id: owner_id,
            })
            .await?;

        tracing::info!(
            risk_id = %risk_id,
            approval_id = %workflow.id,
            requester_id = %ctx.user_id,
            approver_id = %owner_id,
            "Risk acceptance requested"
        );

        self.notifier.notify(
            owner_id,
            "Risk acceptance requested",
            &format!(
                "Your approval is requested to accept the risk \"{}\".",
                risk.title
            ),
        );
        self.notifier
            .notify_org_event(risk.organization_id, "approval_workflow", "created");

        Ok(workflow)
    }

    /// Record the approver's decision on a pending workflow.
    pub async fn decide(
        &self,
        ctx: &UserContext,
        risk_id: Uuid,
        approval_id: Uuid,
        request: DecisionRequest,
    ) -> Result<ApprovalWorkflow, ApiError> {
        let risk = self.load_risk(ctx, risk_id).await?;

        let workflow = self
            .approval_repo
            .get_for_risk(ctx.organization_id, risk_id, approval_id)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(format!("Approval workflow {} not found", approval_id))
            })?;

        if workflow.approver_id != ctx.user_id {
            return Err(ApiError::authorization(
                "Only the designated approver can decide this request",
            ));
        }
        if workflow.status.is_terminal() {
            return Err(ApiError::conflict(format!(
                "Approval workflow was already {}",
                workflow.status
            )));
        }

        let comments = request
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let decided = self
            .approval_repo
            .record_decision(
                ctx.organization_id,
                risk_id,
                approval_id,
                request.decision,
                comments,
            )
            .await?;

        tracing::info!(
            risk_id = %risk_id,
            approval_id = %approval_id,
            approver_id = %ctx.user_id,
            status = %decided.status,
            "Risk acceptance decided"
        );

        self.notify_decision(&risk, &decided).await;

        Ok(decided)
    }

    /// Workflows of a risk, newest first.
    pub async fn get_history(
        &self,
        ctx: &UserContext,
        risk_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<ApprovalWorkflow>, ApiError> {
        require_permission!(ctx, Permission::ViewRisks);
        self.load_risk(ctx, risk_id).await?;

        let items = self.approval_repo.list_by_risk(risk_id, pagination).await?;
        let total = self.approval_repo.count_by_risk(risk_id).await?;

        Ok(Page::new(items, total, pagination))
    }

    async fn load_risk(&self, ctx: &UserContext, risk_id: Uuid) -> Result<Risk, ApiError> {
        self.risk_repo
            .get_by_id(ctx.organization_id, risk_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Risk {} not found", risk_id)))
    }

    /// Runs after commit; lookup failures here never undo the decision.
    async fn notify_decision(&self, risk: &Risk, workflow: &ApprovalWorkflow) {
        let (subject, body) = match workflow.status {
            ApprovalStatus::Approved => (
                "Risk acceptance approved",
                format!("The risk \"{}\" has been accepted.", risk.title),
            ),
            ApprovalStatus::Rejected => (
                "Risk acceptance rejected",
                format!("The acceptance of risk \"{}\" was rejected.", risk.title),
            ),
            ApprovalStatus::Pending => return,
        };

        let mut recipients = vec![workflow.requester_id];
        if let Some(owner) = risk.owner_id {
            recipients.push(owner);
        }
        match self.stakeholder_repo.list(risk.id).await {
            Ok(stakeholders) => recipients.extend(stakeholders.into_iter().map(|s| s.user_id)),
            Err(e) => tracing::warn!(
                risk_id = %risk.id,
                error = %e,
                "Could not load stakeholders for decision notification"
            ),
        }
        recipients.sort();
        recipients.dedup();

        for recipient in recipients {
            self.notifier.notify(recipient, subject, &body);
        }

        let event = match workflow.status {
            ApprovalStatus::Approved => "approved",
            _ => "rejected",
        };
        self.notifier
            .notify_org_event(risk.organization_id, "approval_workflow", event);
    }
}
