use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Permission {
    // Risk register
    ViewRisks,
    CreateRisk,
    EditAnyRisk,
    ReassignRiskOwner,
    ManageStakeholders,

    // Acceptance workflow
    SubmitRiskAcceptance,

    // Audit self-assessment
    ViewCompliance,
    SubmitAssessment,
}

impl Role {
    pub fn permissions(&self) -> Vec<Permission> {
        match self {
            Role::Admin | Role::Manager => vec![
                Permission::ViewRisks,
                Permission::CreateRisk,
                Permission::EditAnyRisk,
                Permission::ReassignRiskOwner,
                Permission::ManageStakeholders,
                Permission::SubmitRiskAcceptance,
                Permission::ViewCompliance,
                Permission::SubmitAssessment,
            ],
            Role::User => vec![
                Permission::ViewRisks,
                Permission::CreateRisk,
                Permission::ViewCompliance,
            ],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

#[macro_export]
macro_rules! require_permission {
    ($user:expr, $perm:expr) => {
        if !$user.has_permission($perm) {
            return Err($crate::error::ApiError::Authorization(format!(
                "Permission {:?} required",
                $perm
            )));
        }
    };
}
