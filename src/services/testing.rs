//! In-memory repositories shared by the service unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::*,
    repositories::{ApprovalRepository, AuditRepository, RiskRepository, StakeholderRepository},
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, Uuid>,
    risks: Vec<Risk>,
    stakeholders: Vec<RiskStakeholder>,
    workflows: Vec<ApprovalWorkflow>,
    frameworks: Vec<AuditFramework>,
    controls: Vec<AuditControl>,
    assessments: Vec<AuditAssessment>,
    practices: Vec<C2M2PracticeEvaluation>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, organization_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().users.insert(id, organization_id);
        id
    }

    pub fn add_risk(&self, organization_id: Uuid, owner_id: Option<Uuid>) -> Risk {
        let risk = Risk {
            id: Uuid::new_v4(),
            organization_id,
            title: "Legacy ERP without vendor support".to_string(),
            description: None,
            category: RiskCategory::Technological,
            impact: Severity::High,
            probability: Severity::Medium,
            risk_level: Severity::High,
            status: RiskStatus::Open,
            owner_id,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.state.lock().unwrap().risks.push(risk.clone());
        risk
    }

    pub fn risk(&self, id: Uuid) -> Option<Risk> {
        self.state.lock().unwrap().risks.iter().find(|r| r.id == id).cloned()
    }

    pub fn workflow(&self, id: Uuid) -> Option<ApprovalWorkflow> {
        self.state
            .lock()
            .unwrap()
            .workflows
            .iter()
            .find(|w| w.id == id)
            .cloned()
    }

    pub fn add_framework(&self, name: &str) -> AuditFramework {
        let framework = AuditFramework {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().frameworks.push(framework.clone());
        framework
    }

    pub fn add_control(&self, framework_id: Uuid, code: &str, family: &str) -> AuditControl {
        let mut state = self.state.lock().unwrap();
        let control = AuditControl {
            id: Uuid::new_v4(),
            framework_id,
            control_code: code.to_string(),
            family: family.to_string(),
            description: None,
            display_order: state.controls.len() as i32,
        };
        state.controls.push(control.clone());
        control
    }

    pub fn assessment_count(&self) -> usize {
        self.state.lock().unwrap().assessments.len()
    }
}

#[async_trait]
impl RiskRepository for InMemoryStore {
    async fn insert(&self, risk: &Risk) -> Result<Risk, ApiError> {
        self.state.lock().unwrap().risks.push(risk.clone());
        Ok(risk.clone())
    }

    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Risk>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .risks
            .iter()
            .find(|r| r.id == id && r.organization_id == organization_id)
            .cloned())
    }

    async fn list(
        &self,
        organization_id: Uuid,
        filter: &RiskFilter,
        pagination: Pagination,
    ) -> Result<Vec<Risk>, ApiError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Risk> = state
            .risks
            .iter()
            .filter(|r| r.organization_id == organization_id)
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .filter(|r| filter.category.map_or(true, |c| r.category == c))
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect())
    }

    async fn count(&self, organization_id: Uuid, filter: &RiskFilter) -> Result<i64, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .risks
            .iter()
            .filter(|r| r.organization_id == organization_id)
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .filter(|r| filter.category.map_or(true, |c| r.category == c))
            .count() as i64)
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        changes: &RiskChanges,
    ) -> Result<Risk, ApiError> {
        let mut state = self.state.lock().unwrap();
        let risk = state
            .risks
            .iter_mut()
            .find(|r| r.id == id && r.organization_id == organization_id)
            .ok_or_else(|| ApiError::not_found(format!("Risk {} not found", id)))?;
        changes.apply(risk);
        risk.updated_at = Utc::now();
        Ok(risk.clone())
    }

    async fn user_in_organization(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ApiError> {
        Ok(self.state.lock().unwrap().users.get(&user_id) == Some(&organization_id))
    }
}

#[async_trait]
impl StakeholderRepository for InMemoryStore {
    async fn add(&self, risk_id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
        let mut state = self.state.lock().unwrap();
        if state
            .stakeholders
            .iter()
            .any(|s| s.risk_id == risk_id && s.user_id == user_id)
        {
            return Ok(false);
        }
        state.stakeholders.push(RiskStakeholder {
            risk_id,
            user_id,
            email: format!("{}@example.org", user_id.simple()),
            name: None,
            added_at: Utc::now(),
        });
        Ok(true)
    }

    async fn remove(&self, risk_id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
        let mut state = self.state.lock().unwrap();
        let before = state.stakeholders.len();
        state
            .stakeholders
            .retain(|s| !(s.risk_id == risk_id && s.user_id == user_id));
        Ok(state.stakeholders.len() < before)
    }

    async fn list(&self, risk_id: Uuid) -> Result<Vec<RiskStakeholder>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .stakeholders
            .iter()
            .filter(|s| s.risk_id == risk_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ApprovalRepository for InMemoryStore {
    async fn find_pending(&self, risk_id: Uuid) -> Result<Option<ApprovalWorkflow>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .workflows
            .iter()
            .find(|w| w.risk_id == risk_id && w.status == ApprovalStatus::Pending)
            .cloned())
    }

    async fn create(
        &self,
        workflow: &ApprovalWorkflowCreate,
    ) -> Result<ApprovalWorkflow, ApiError> {
        let mut state = self.state.lock().unwrap();
        if state
            .workflows
            .iter()
            .any(|w| w.risk_id == workflow.risk_id && w.status == ApprovalStatus::Pending)
        {
            return Err(ApiError::conflict("pending workflow exists"));
        }
        let row = ApprovalWorkflow {
            id: Uuid::new_v4(),
            risk_id: workflow.risk_id,
            requester_id: workflow.requester_id,
            approver_id: workflow.approver_id,
            status: ApprovalStatus::Pending,
            comments: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            decided_at: None,
        };
        state.workflows.push(row.clone());
        Ok(row)
    }

    async fn get_for_risk(
        &self,
        organization_id: Uuid,
        risk_id: Uuid,
        approval_id: Uuid,
    ) -> Result<Option<ApprovalWorkflow>, ApiError> {
        let state = self.state.lock().unwrap();
        let in_org = state
            .risks
            .iter()
            .any(|r| r.id == risk_id && r.organization_id == organization_id);
        Ok(state
            .workflows
            .iter()
            .find(|w| in_org && w.id == approval_id && w.risk_id == risk_id)
            .cloned())
    }

    async fn record_decision(
        &self,
        organization_id: Uuid,
        risk_id: Uuid,
        approval_id: Uuid,
        decision: Decision,
        comments: Option<String>,
    ) -> Result<ApprovalWorkflow, ApiError> {
        let mut state = self.state.lock().unwrap();
        let State {
            risks, workflows, ..
        } = &mut *state;

        let risk = risks
            .iter_mut()
            .find(|r| r.id == risk_id && r.organization_id == organization_id)
            .ok_or_else(|| ApiError::not_found("risk"))?;
        let workflow = workflows
            .iter_mut()
            .find(|w| w.id == approval_id && w.risk_id == risk_id)
            .ok_or_else(|| ApiError::not_found("workflow"))?;

        let next = workflow.status.transition(decision)?;
        workflow.status = next;
        workflow.comments = comments;
        workflow.decided_at = Some(Utc::now());
        if next == ApprovalStatus::Approved {
            risk.status = RiskStatus::Accepted;
        }
        Ok(workflow.clone())
    }

    async fn list_by_risk(
        &self,
        risk_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<ApprovalWorkflow>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .workflows
            .iter()
            .rev()
            .filter(|w| w.risk_id == risk_id)
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect())
    }

    async fn count_by_risk(&self, risk_id: Uuid) -> Result<i64, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state.workflows.iter().filter(|w| w.risk_id == risk_id).count() as i64)
    }
}

#[async_trait]
impl AuditRepository for InMemoryStore {
    async fn list_frameworks(&self) -> Result<Vec<AuditFramework>, ApiError> {
        Ok(self.state.lock().unwrap().frameworks.clone())
    }

    async fn get_framework(&self, id: Uuid) -> Result<Option<AuditFramework>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .frameworks
            .iter()
            .find(|f| f.id == id)
            .cloned())
    }

    async fn list_controls(&self, framework_id: Uuid) -> Result<Vec<AuditControl>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .controls
            .iter()
            .filter(|c| c.framework_id == framework_id)
            .cloned()
            .collect())
    }

    async fn get_control(&self, id: Uuid) -> Result<Option<AuditControl>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .controls
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_assessments(
        &self,
        organization_id: Uuid,
        framework_id: Uuid,
    ) -> Result<Vec<AuditAssessment>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .assessments
            .iter()
            .filter(|a| a.organization_id == organization_id)
            .filter(|a| {
                state
                    .controls
                    .iter()
                    .any(|c| c.id == a.audit_control_id && c.framework_id == framework_id)
            })
            .cloned()
            .collect())
    }

    async fn list_practice_evaluations(
        &self,
        assessment_ids: &[Uuid],
    ) -> Result<Vec<C2M2PracticeEvaluation>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .practices
            .iter()
            .filter(|p| assessment_ids.contains(&p.assessment_id))
            .cloned()
            .collect())
    }

    async fn upsert_assessment(
        &self,
        upsert: &AssessmentUpsert,
    ) -> Result<AssessmentWithPractices, ApiError> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();

        let position = state.assessments.iter().position(|a| {
            a.organization_id == upsert.organization_id
                && a.audit_control_id == upsert.audit_control_id
        });
        let assessment = match position {
            Some(i) => {
                let existing = &mut state.assessments[i];
                existing.status = upsert.status;
                existing.score = upsert.score;
                existing.evidence_url = upsert
                    .evidence_url
                    .clone()
                    .or_else(|| existing.evidence_url.clone());
                existing.assessment_date = upsert.assessment_date;
                existing.comments = upsert.comments.clone();
                existing.c2m2_assessment_date = upsert.c2m2_assessment_date;
                existing.c2m2_comments = upsert.c2m2_comments.clone();
                existing.assessed_by = Some(upsert.assessed_by);
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let row = AuditAssessment {
                    id: Uuid::new_v4(),
                    organization_id: upsert.organization_id,
                    audit_control_id: upsert.audit_control_id,
                    status: upsert.status,
                    score: upsert.score,
                    evidence_url: upsert.evidence_url.clone(),
                    assessment_date: upsert.assessment_date,
                    comments: upsert.comments.clone(),
                    c2m2_assessment_date: upsert.c2m2_assessment_date,
                    c2m2_comments: upsert.c2m2_comments.clone(),
                    assessed_by: Some(upsert.assessed_by),
                    created_at: now,
                    updated_at: now,
                };
                state.assessments.push(row.clone());
                row
            }
        };

        for input in &upsert.practice_evaluations {
            match state
                .practices
                .iter_mut()
                .find(|p| p.assessment_id == assessment.id && p.practice_id == input.practice_id)
            {
                Some(existing) => {
                    existing.mil_level = input.mil_level;
                    existing.status = input.status;
                    existing.updated_at = now;
                }
                None => state.practices.push(C2M2PracticeEvaluation {
                    id: Uuid::new_v4(),
                    assessment_id: assessment.id,
                    practice_id: input.practice_id.clone(),
                    mil_level: input.mil_level,
                    status: input.status,
                    updated_at: now,
                }),
            }
        }

        let practice_evaluations = state
            .practices
            .iter()
            .filter(|p| p.assessment_id == assessment.id)
            .cloned()
            .collect();

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
        let mut state = self.state.lock().unwrap();
        Ok(state
            .assessments
            .iter_mut()
            .find(|a| a.id == assessment_id && a.organization_id == organization_id)
            .map(|a| {
                a.evidence_url = None;
                a.clone()
            }))
    }
}
